//! Lane Dash - an arcade lane-dodging driving game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (vehicle, obstacle pool, collisions, session lifecycle)
//! - `clock`: Fixed timestep accumulator fed by animation frames
//! - `app`: Frame driver tying clock, session, events and leaderboard together
//! - `persistence`: Storage backends (LocalStorage on web, files on native)
//! - `leaderboard`: Top 10 fastest completed runs
//! - `tuning`: Data-driven game balance

pub mod app;
pub mod assets;
pub mod clock;
pub mod input;
pub mod leaderboard;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use app::App;
pub use clock::FixedStepClock;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use settings::{ControlScheme, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const STEP: f64 = 1.0 / 50.0;
    /// Maximum ticks drained per frame to prevent spiral of death
    pub const MAX_TICKS_PER_DRAIN: u32 = 5;
    /// Frame deltas above this are clamped before accumulation (tab resume)
    pub const MAX_FRAME_DELTA: f64 = 0.25;

    /// m/s -> km/h
    pub const MS_TO_KMH: f64 = 3.6;

    /// Default seed used by the native demo run
    pub const DEMO_SEED: u64 = 0x1a7e_da54;
}

/// Convert a speed in m/s to km/h (HUD display)
#[inline]
pub fn to_kmh(meters_per_second: f64) -> f64 {
    meters_per_second * consts::MS_TO_KMH
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting
#[inline]
pub fn approach(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = (target - current).clamp(-max_delta, max_delta);
    current + delta
}
