//! Session state and core simulation types
//!
//! Everything the tick loop mutates lives in `SessionContext`, owned by a
//! single `Session`. Nothing here is global, so several sessions can run side
//! by side (tests do exactly that).

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::intro::IntroSweep;
use super::obstacle::ObstaclePool;
use super::score::ScoreTracker;
use super::vehicle::Vehicle;
use crate::assets::BoundingVolumes;
use crate::tuning::Tuning;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for a start command
    Idle,
    /// Scripted camera sweep, no simulation
    Intro,
    /// Full simulation
    Racing,
    /// Racing with at least one collision on the clock (cosmetic overlay)
    Warning,
    /// Too many collisions
    GameOver,
    /// Completion distance reached
    Completed,
}

impl SessionState {
    /// Racing or its Warning sub-state
    pub fn is_racing(&self) -> bool {
        matches!(self, SessionState::Racing | SessionState::Warning)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::GameOver | SessionState::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    GameOver,
}

/// Final numbers for a run, computed once on the terminal transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub outcome: RunOutcome,
    /// Seed of the session that produced the run
    pub seed: u64,
    /// Seconds of Racing
    pub elapsed: f64,
    pub distance: f64,
    /// distance / elapsed (m/s)
    pub average_speed: f64,
    pub collisions: u32,
    pub score: u32,
}

/// Closed set of things the session tells the outside world about
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Transition { from: SessionState, to: SessionState },
    Collision { obstacle: usize, count: u32 },
    Spawned { obstacle: usize, lane: f64, behind: bool },
    Finished(RunStats),
}

/// All mutable simulation state for one session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub seed: u64,
    pub rng: Pcg32,
    pub vehicle: Vehicle,
    pub pool: ObstaclePool,
    pub score: ScoreTracker,
    pub volumes: BoundingVolumes,
    pub intro: IntroSweep,
    /// Fixed ticks simulated since the current run began
    pub time_ticks: u64,
}

impl SessionContext {
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            vehicle: Vehicle::new(&tuning.vehicle),
            pool: ObstaclePool::new(tuning.obstacles.capacity),
            score: ScoreTracker::default(),
            volumes: BoundingVolumes::default(),
            intro: IntroSweep::new(tuning.session.intro_duration),
            time_ticks: 0,
        }
    }

    /// Fresh run: vehicle back to defaults with a grace window, pool emptied,
    /// timers zeroed. Asset volumes and the RNG stream carry over.
    pub fn begin_run(&mut self, tuning: &Tuning) {
        self.vehicle
            .reset(&tuning.vehicle, tuning.collision.invulnerability);
        self.pool.clear();
        self.score = ScoreTracker::new(self.vehicle.forward_position);
        self.time_ticks = 0;
    }

    pub fn stats(&self, outcome: RunOutcome) -> RunStats {
        RunStats {
            outcome,
            seed: self.seed,
            elapsed: self.score.elapsed,
            distance: self.score.distance,
            average_speed: self.score.average_speed(),
            collisions: self.vehicle.collision_count,
            score: self.score.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(SessionState::Warning.is_racing());
        assert!(!SessionState::Intro.is_racing());
        assert!(SessionState::Completed.is_terminal());
        assert!(!SessionState::Idle.is_terminal());
    }

    #[test]
    fn test_begin_run_resets() {
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(&tuning, 1);
        ctx.vehicle.forward_position = 500.0;
        ctx.vehicle.collision_count = 2;
        ctx.time_ticks = 99;
        ctx.begin_run(&tuning);
        assert_eq!(ctx.vehicle.forward_position, 0.0);
        assert_eq!(ctx.vehicle.collision_count, 0);
        assert!(ctx.vehicle.invulnerable);
        assert_eq!(ctx.time_ticks, 0);
        assert_eq!(ctx.pool.active_count(), 0);
    }
}
