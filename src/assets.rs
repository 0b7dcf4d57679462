//! Asset-ready signals and collision volume sizing
//!
//! The render layer loads models asynchronously and reports back once per
//! model with an `AssetEvent`. The core never waits on it: until a model
//! reports in (or if it fails), a default box is used.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::ObstacleKind;

/// Default vehicle half extents (lateral, height, length)
pub const DEFAULT_VEHICLE_HALF_EXTENTS: DVec3 = DVec3::new(0.9, 0.7, 2.0);
/// Default base obstacle half extents before the per-kind scale
pub const DEFAULT_OBSTACLE_HALF_EXTENTS: DVec3 = DVec3::new(1.0, 1.0, 1.0);
/// Reported extents are clamped to this so collision reach stays inside the recycle range
pub const MAX_HALF_EXTENT: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetTarget {
    Vehicle,
    Obstacle,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("model '{name}' failed to load: {reason}")]
    LoadFailed { name: String, reason: String },
    #[error("model reported unusable dimensions {0:?}")]
    InvalidDimensions(DVec3),
}

/// Completion signal from the asset loader
#[derive(Debug, Clone, PartialEq)]
pub enum AssetEvent {
    Ready { target: AssetTarget, half_extents: DVec3 },
    Failed { target: AssetTarget, error: AssetError },
}

/// Collision volume table with placeholder fallbacks
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolumes {
    vehicle: DVec3,
    obstacle: DVec3,
    vehicle_resolved: bool,
    obstacle_resolved: bool,
}

impl Default for BoundingVolumes {
    fn default() -> Self {
        Self {
            vehicle: DEFAULT_VEHICLE_HALF_EXTENTS,
            obstacle: DEFAULT_OBSTACLE_HALF_EXTENTS,
            vehicle_resolved: false,
            obstacle_resolved: false,
        }
    }
}

impl BoundingVolumes {
    pub fn vehicle_half_extents(&self) -> DVec3 {
        self.vehicle
    }

    pub fn obstacle_half_extents(&self, kind: ObstacleKind) -> DVec3 {
        self.obstacle * kind.scale()
    }

    pub fn is_resolved(&self, target: AssetTarget) -> bool {
        match target {
            AssetTarget::Vehicle => self.vehicle_resolved,
            AssetTarget::Obstacle => self.obstacle_resolved,
        }
    }

    /// Consume a loader signal. Each target is resolved at most once; later
    /// signals for it are ignored. Returns whether the event was consumed.
    pub fn apply(&mut self, event: AssetEvent) -> bool {
        let target = match &event {
            AssetEvent::Ready { target, .. } | AssetEvent::Failed { target, .. } => *target,
        };
        if self.is_resolved(target) {
            log::debug!("Ignoring repeated asset signal for {:?}", target);
            return false;
        }

        let extents = match event {
            AssetEvent::Ready { half_extents, .. } => match sanitize(half_extents) {
                Ok(extents) => Some(extents),
                Err(e) => {
                    log::warn!("{}; keeping default {:?} volume", e, target);
                    None
                }
            },
            AssetEvent::Failed { error, .. } => {
                log::warn!("{}; using placeholder {:?} volume", error, target);
                None
            }
        };

        match target {
            AssetTarget::Vehicle => {
                if let Some(extents) = extents {
                    self.vehicle = extents;
                }
                self.vehicle_resolved = true;
            }
            AssetTarget::Obstacle => {
                if let Some(extents) = extents {
                    self.obstacle = extents;
                }
                self.obstacle_resolved = true;
            }
        }
        true
    }
}

fn sanitize(half_extents: DVec3) -> Result<DVec3, AssetError> {
    if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
        return Err(AssetError::InvalidDimensions(half_extents));
    }
    Ok(half_extents.min(DVec3::splat(MAX_HALF_EXTENT)))
}
