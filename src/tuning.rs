//! Data-driven game balance
//!
//! Every gameplay constant lives here so a run can be retuned from JSON
//! without recompiling. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::MAX_HALF_EXTENT;
use crate::sim::ObstacleKind;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Player vehicle kinematics (meters, seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub min_velocity: f64,
    /// Velocity the car eases back to with no throttle input (also the start velocity)
    pub base_velocity: f64,
    pub max_velocity: f64,
    pub accel_rate: f64,
    pub decel_rate: f64,
    pub idle_rate: f64,
    /// Lateral speed while a steer button is held
    pub lateral_speed: f64,
    /// Per-tick lateral velocity decay factor with no steer input
    pub lateral_decay: f64,
    /// Lateral velocity below this snaps to zero
    pub lateral_epsilon: f64,
    /// Lateral position is clamped to +/- this
    pub road_half_width: f64,
    /// Wheel scheme: heading at full lock (radians)
    pub max_steer_angle: f64,
    /// Wheel scheme: heading change rate (radians/s)
    pub steer_response: f64,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            min_velocity: 2.778,
            base_velocity: 6.944,
            max_velocity: 44.444,
            accel_rate: 5.0,
            decel_rate: 8.0,
            idle_rate: 2.0,
            lateral_speed: 6.0,
            lateral_decay: 0.9,
            lateral_epsilon: 0.05,
            road_half_width: 4.5,
            max_steer_angle: 0.35,
            steer_response: 1.5,
        }
    }
}

/// Obstacle pool sizing, spawn placement and speed assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub capacity: usize,
    pub lanes: Vec<f64>,
    /// Seconds between spawn attempts
    pub spawn_interval: f64,
    /// Behind spawns: distance = min + random * range
    pub behind_min_distance: f64,
    pub behind_distance_range: f64,
    /// Ahead spawns: distance = min + random * range
    pub ahead_min_distance: f64,
    pub ahead_distance_range: f64,
    pub base_speed: f64,
    pub speed_jitter: f64,
    /// Speed multiplier for obstacles spawned ahead (catchable)
    pub ahead_speed_factor: f64,
    /// Extra speed for obstacles spawned behind (pursuing)
    pub pursuit_bonus: f64,
    /// Difficulty ramp: added obstacle speed per second of session time
    pub ramp_coefficient: f64,
    /// Recycle once this far ahead of the vehicle
    pub recycle_ahead: f64,
    /// Recycle once this far behind the vehicle
    pub recycle_behind: f64,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            capacity: 10,
            lanes: vec![-3.0, 0.0, 3.0],
            spawn_interval: 1.2,
            behind_min_distance: 30.0,
            behind_distance_range: 40.0,
            ahead_min_distance: 60.0,
            ahead_distance_range: 60.0,
            base_speed: 8.0,
            speed_jitter: 3.0,
            ahead_speed_factor: 0.5,
            pursuit_bonus: 6.0,
            ramp_coefficient: 0.15,
            recycle_ahead: 150.0,
            recycle_behind: 80.0,
        }
    }
}

impl ObstacleTuning {
    /// Smallest possible spawn distance from the vehicle
    pub fn min_spawn_distance(&self) -> f64 {
        self.behind_min_distance.min(self.ahead_min_distance)
    }
}

/// Collision volumes and damage policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Added to every bounding box half extent on each axis
    pub margin: f64,
    /// Collisions needed to end the run
    pub threshold: u32,
    /// Grace period after start/reset (seconds)
    pub invulnerability: f64,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            margin: 0.3,
            threshold: 3,
            invulnerability: 3.0,
        }
    }
}

/// Session lifecycle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub completion_distance: f64,
    /// Intro camera sweep length (seconds)
    pub intro_duration: f64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            completion_distance: 2000.0,
            intro_duration: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub vehicle: VehicleTuning,
    pub obstacles: ObstacleTuning,
    pub collision: CollisionTuning,
    pub session: SessionTuning,
}

impl CollisionTuning {
    /// Largest center-to-center track distance at which any vehicle/obstacle
    /// pair can still overlap. Spawn and recycle distances must exceed it.
    pub fn max_reach(&self) -> f64 {
        let largest_scale = ObstacleKind::ALL
            .iter()
            .map(|k| k.scale())
            .fold(0.0, f64::max);
        MAX_HALF_EXTENT * (1.0 + largest_scale) + 2.0 * self.margin
    }
}

impl Tuning {
    /// Parse and validate a tuning file
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let v = &self.vehicle;
        if !(v.min_velocity >= 0.0
            && v.min_velocity <= v.base_velocity
            && v.base_velocity <= v.max_velocity)
        {
            return Err(TuningError::Invalid(format!(
                "velocities must satisfy 0 <= min ({}) <= base ({}) <= max ({})",
                v.min_velocity, v.base_velocity, v.max_velocity
            )));
        }
        if !(0.0..1.0).contains(&v.lateral_decay) {
            return Err(TuningError::Invalid("lateral_decay must be in [0, 1)".into()));
        }

        let c = &self.collision;
        if c.threshold == 0 {
            return Err(TuningError::Invalid("collision threshold must be >= 1".into()));
        }
        if c.margin < 0.0 || c.invulnerability < 0.0 {
            return Err(TuningError::Invalid(
                "margin and invulnerability must be non-negative".into(),
            ));
        }

        let o = &self.obstacles;
        if o.capacity == 0 || o.capacity > 64 {
            return Err(TuningError::Invalid(format!(
                "obstacle capacity {} outside 1..=64",
                o.capacity
            )));
        }
        if o.lanes.is_empty() {
            return Err(TuningError::Invalid("at least one lane is required".into()));
        }
        if o.spawn_interval <= 0.0 {
            return Err(TuningError::Invalid("spawn_interval must be positive".into()));
        }
        if o.min_spawn_distance() <= c.max_reach() {
            return Err(TuningError::Invalid(format!(
                "spawn distance floor {} must exceed collision reach {:.1}",
                o.min_spawn_distance(),
                c.max_reach()
            )));
        }
        if o.recycle_ahead <= o.ahead_min_distance + o.ahead_distance_range {
            return Err(TuningError::Invalid(
                "recycle_ahead must lie beyond the ahead spawn range".into(),
            ));
        }
        if o.recycle_behind <= o.behind_min_distance + o.behind_distance_range {
            return Err(TuningError::Invalid(
                "recycle_behind must lie beyond the behind spawn range".into(),
            ));
        }

        if self.session.completion_distance <= 0.0 {
            return Err(TuningError::Invalid(
                "completion_distance must be positive".into(),
            ));
        }
        Ok(())
    }
}
