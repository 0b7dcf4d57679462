//! Fixed timestep clock
//!
//! Turns variable animation-frame deltas into a deterministic run of fixed-size
//! simulation ticks. Oversized deltas (tab resumed after being backgrounded) are
//! clamped, and at most `max_ticks` are drained per frame; any backlog beyond
//! that is dropped rather than fast-forwarded.

use crate::consts::{MAX_FRAME_DELTA, MAX_TICKS_PER_DRAIN, STEP};

/// Tolerance so that a frame of exactly one step always yields one tick
const STEP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f64,
    max_ticks: u32,
    max_frame_delta: f64,
    accumulator: f64,
    /// Total ticks handed out since creation/reset
    pub total_ticks: u64,
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(STEP, MAX_TICKS_PER_DRAIN)
    }
}

impl FixedStepClock {
    pub fn new(step: f64, max_ticks: u32) -> Self {
        Self {
            step,
            max_ticks: max_ticks.max(1),
            max_frame_delta: MAX_FRAME_DELTA,
            accumulator: 0.0,
            total_ticks: 0,
        }
    }

    /// Buffer one frame's wall-clock delta (seconds)
    pub fn accumulate(&mut self, frame_delta: f64) {
        if !frame_delta.is_finite() || frame_delta <= 0.0 {
            return;
        }
        let delta = if frame_delta > self.max_frame_delta {
            log::warn!(
                "Frame delta {:.1}ms clamped to {:.1}ms",
                frame_delta * 1000.0,
                self.max_frame_delta * 1000.0
            );
            self.max_frame_delta
        } else {
            frame_delta
        };
        self.accumulator += delta;
    }

    /// Yield the ticks owed for buffered time, capped at `max_ticks`
    pub fn drain(&mut self) -> impl Iterator<Item = f64> + use<> {
        let mut ticks = 0;
        while self.accumulator + STEP_EPSILON >= self.step && ticks < self.max_ticks {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if self.accumulator + STEP_EPSILON >= self.step {
            log::debug!(
                "Dropping {:.1}ms of simulation backlog",
                (self.accumulator - self.accumulator % self.step) * 1000.0
            );
            self.accumulator %= self.step;
        }
        self.accumulator = self.accumulator.max(0.0);
        self.total_ticks += u64::from(ticks);
        std::iter::repeat_n(self.step, ticks as usize)
    }

    /// Drop any buffered time (used while the session is not ticking)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_step_frame_yields_one_tick() {
        let mut clock = FixedStepClock::default();
        for _ in 0..50 {
            clock.accumulate(STEP);
            assert_eq!(clock.drain().count(), 1);
        }
        assert_eq!(clock.total_ticks, 50);
    }

    #[test]
    fn test_small_frames_accumulate() {
        let mut clock = FixedStepClock::default();
        clock.accumulate(0.008);
        assert_eq!(clock.drain().count(), 0);
        clock.accumulate(0.008);
        assert_eq!(clock.drain().count(), 0);
        clock.accumulate(0.008);
        assert_eq!(clock.drain().count(), 1);
        // Leftover 4ms carries into the next frame
        clock.accumulate(0.016);
        assert_eq!(clock.drain().count(), 1);
    }

    #[test]
    fn test_huge_delta_is_capped() {
        let mut clock = FixedStepClock::default();
        clock.accumulate(30.0);
        let ticks: Vec<f64> = clock.drain().collect();
        assert_eq!(ticks.len(), MAX_TICKS_PER_DRAIN as usize);
        assert!(ticks.iter().all(|&dt| dt == STEP));
        // Backlog discarded, not carried into the next frame
        assert_eq!(clock.drain().count(), 0);
    }

    #[test]
    fn test_invalid_deltas_ignored() {
        let mut clock = FixedStepClock::default();
        clock.accumulate(-1.0);
        clock.accumulate(f64::NAN);
        assert_eq!(clock.drain().count(), 0);
    }
}
