//! Scripted intro camera sweep
//!
//! Only the timing lives here. The camera collaborator reads `progress()` each
//! frame and frames the shot; the session polls `advance()` to learn when the
//! sweep is over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroSweep {
    pub duration: f64,
    pub elapsed: f64,
}

impl IntroSweep {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Add wall-clock time; returns true once the sweep has finished
    pub fn advance(&mut self, dt: f64) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Eased 0..=1 progress (smoothstep)
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_finishes() {
        let mut sweep = IntroSweep::new(1.0);
        assert!(!sweep.advance(0.4));
        assert!((sweep.progress() - 0.352).abs() < 1e-9);
        assert!(!sweep.advance(0.4));
        assert!(sweep.advance(0.4));
        assert_eq!(sweep.progress(), 1.0);
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let mut sweep = IntroSweep::new(0.0);
        assert!(sweep.advance(0.0));
        assert_eq!(sweep.progress(), 1.0);
    }
}
