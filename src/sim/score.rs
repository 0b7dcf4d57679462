//! Distance, score and difficulty ramp

use serde::{Deserialize, Serialize};

/// Obstacle speed bonus after `elapsed` seconds (strictly increasing, unbounded)
#[inline]
pub fn difficulty_ramp(elapsed: f64, coefficient: f64) -> f64 {
    elapsed * coefficient
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    /// Vehicle forward position when the run began
    pub start_position: f64,
    /// Seconds of Racing simulated so far
    pub elapsed: f64,
    pub distance: f64,
    pub score: u32,
}

impl ScoreTracker {
    pub fn new(start_position: f64) -> Self {
        Self {
            start_position,
            ..Default::default()
        }
    }

    pub fn update(&mut self, vehicle_forward: f64, dt: f64) {
        self.elapsed += dt;
        self.distance = (vehicle_forward - self.start_position).max(0.0);
        self.score = self.distance.floor() as u32;
    }

    pub fn ramp(&self, coefficient: f64) -> f64 {
        difficulty_ramp(self.elapsed, coefficient)
    }

    /// Average speed over the run so far (m/s)
    pub fn average_speed(&self) -> f64 {
        if self.elapsed > 0.0 {
            self.distance / self.elapsed
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_floor_of_distance() {
        let mut tracker = ScoreTracker::new(10.0);
        tracker.update(25.7, 0.5);
        assert!((tracker.distance - 15.7).abs() < 1e-9);
        assert_eq!(tracker.score, 15);
        assert!((tracker.average_speed() - 31.4).abs() < 1e-9);
    }

    #[test]
    fn test_distance_never_negative() {
        let mut tracker = ScoreTracker::new(10.0);
        tracker.update(5.0, 0.02);
        assert_eq!(tracker.distance, 0.0);
        assert_eq!(tracker.score, 0);
    }

    #[test]
    fn test_ramp_strictly_increasing() {
        let a = difficulty_ramp(1.0, 0.15);
        let b = difficulty_ramp(2.0, 0.15);
        assert!(b > a);
        assert_eq!(difficulty_ramp(0.0, 0.15), 0.0);
    }
}
