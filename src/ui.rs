//! Per-frame snapshots handed to the UI and render layers

use serde::Serialize;

use crate::sim::{ObstacleKind, Session, SessionState};
use crate::to_kmh;

/// Escalating urgency of the warning overlay (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WarningLevel {
    None,
    Low,
    High,
    Critical,
}

impl WarningLevel {
    /// One hit short of game over is always Critical
    pub fn from_collisions(count: u32, threshold: u32) -> Self {
        if count == 0 {
            WarningLevel::None
        } else if count + 1 >= threshold {
            WarningLevel::Critical
        } else if count * 2 >= threshold {
            WarningLevel::High
        } else {
            WarningLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub state: SessionState,
    pub distance: f64,
    pub score: u32,
    pub elapsed: f64,
    pub speed_kmh: f64,
    pub collision_count: u32,
    /// 1.0 = untouched, 0.0 = game over
    pub health_pct: f64,
    pub warning: WarningLevel,
    pub invulnerable: bool,
    /// Intro sweep progress 0..=1
    pub intro_progress: f64,
    pub terminal: bool,
}

impl HudSnapshot {
    pub fn from_session(session: &Session) -> Self {
        let ctx = session.context();
        let threshold = session.tuning().collision.threshold.max(1);
        let count = ctx.vehicle.collision_count;
        Self {
            state: session.state(),
            distance: ctx.score.distance,
            score: ctx.score.score,
            elapsed: ctx.score.elapsed,
            speed_kmh: to_kmh(ctx.vehicle.forward_velocity),
            collision_count: count,
            health_pct: (1.0 - f64::from(count) / f64::from(threshold)).clamp(0.0, 1.0),
            warning: WarningLevel::from_collisions(count, threshold),
            invulnerable: ctx.vehicle.invulnerable,
            intro_progress: ctx.intro.progress(),
            terminal: session.state().is_terminal(),
        }
    }
}

/// Pose of one active obstacle slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleView {
    pub slot: usize,
    pub lane: f64,
    pub forward: f64,
    pub kind: ObstacleKind,
    pub scale: f64,
}

/// Everything the scene layer needs to place meshes this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub vehicle_lateral: f64,
    pub vehicle_forward: f64,
    pub vehicle_heading: f64,
    pub obstacles: Vec<ObstacleView>,
}

impl SceneSnapshot {
    pub fn from_session(session: &Session) -> Self {
        let ctx = session.context();
        Self {
            vehicle_lateral: ctx.vehicle.lateral_position,
            vehicle_forward: ctx.vehicle.forward_position,
            vehicle_heading: ctx.vehicle.heading,
            obstacles: ctx
                .pool
                .iter_active()
                .map(|(slot, o)| ObstacleView {
                    slot,
                    lane: o.lane,
                    forward: o.forward_position,
                    kind: o.kind,
                    scale: o.kind.scale(),
                })
                .collect(),
        }
    }
}
