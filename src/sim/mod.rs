//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod intro;
pub mod obstacle;
pub mod score;
pub mod session;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use collision::{BoundingBox, CollisionHit, CollisionResolver};
pub use intro::IntroSweep;
pub use obstacle::{Obstacle, ObstacleKind, ObstaclePool, SpawnInfo};
pub use score::{ScoreTracker, difficulty_ramp};
pub use session::Session;
pub use state::{RunOutcome, RunStats, SessionContext, SessionEvent, SessionState};
pub use tick::{TickInput, TickReport, autopilot_input, tick};
pub use vehicle::{ControlScheme, Vehicle, VehicleController};
