//! Pooled obstacle entities
//!
//! A fixed number of slots is allocated once per session. `spawn` and `recycle`
//! are the only code paths that flip `Obstacle::active`; both are no-ops when
//! their precondition fails (no free slot / slot already parked).

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::ObstacleTuning;

/// Track position parked slots are moved to (well off-scene)
pub const PARKED_POSITION: f64 = -1.0e6;

/// Cosmetic obstacle variant. Only affects spawn-time scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Cone,
    Barrier,
    Crate,
    Truck,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Cone,
        ObstacleKind::Barrier,
        ObstacleKind::Crate,
        ObstacleKind::Truck,
    ];

    /// Uniform scale applied to the base obstacle volume
    pub fn scale(&self) -> f64 {
        match self {
            ObstacleKind::Cone => 0.6,
            ObstacleKind::Barrier => 1.0,
            ObstacleKind::Crate => 0.8,
            ObstacleKind::Truck => 1.4,
        }
    }
}

/// One pool slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    active: bool,
    /// Lateral lane offset
    pub lane: f64,
    pub forward_position: f64,
    pub assigned_speed: f64,
    pub kind: ObstacleKind,
}

impl Default for Obstacle {
    fn default() -> Self {
        Self {
            active: false,
            lane: 0.0,
            forward_position: PARKED_POSITION,
            assigned_speed: 0.0,
            kind: ObstacleKind::default(),
        }
    }
}

impl Obstacle {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Where and how a spawn landed (for events/logging)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnInfo {
    pub index: usize,
    pub lane: f64,
    pub behind: bool,
    /// Absolute distance from the vehicle at spawn time
    pub distance: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstaclePool {
    slots: Vec<Obstacle>,
    spawn_timer: f64,
}

impl ObstaclePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Obstacle::default(); capacity],
            spawn_timer: 0.0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|o| o.active).count()
    }

    pub fn get(&self, index: usize) -> Option<&Obstacle> {
        self.slots.get(index)
    }

    /// Move a live slot without touching its activation. False for parked slots.
    #[cfg(test)]
    pub(crate) fn reposition(&mut self, index: usize, forward_position: f64, speed: f64) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.active => {
                slot.forward_position = forward_position;
                slot.assigned_speed = speed;
                true
            }
            _ => false,
        }
    }

    /// All slots in index order, active or parked (render layer reads these)
    pub fn slots(&self) -> &[Obstacle] {
        &self.slots
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &Obstacle)> {
        self.slots.iter().enumerate().filter(|(_, o)| o.active)
    }

    /// Advance the spawn timer; true when a spawn attempt is due
    pub fn spawn_due(&mut self, dt: f64, interval: f64) -> bool {
        self.spawn_timer += dt;
        // Tolerate float drift from summing fixed steps
        if self.spawn_timer + 1e-9 >= interval {
            self.spawn_timer -= interval;
            true
        } else {
            false
        }
    }

    /// Activate the first free slot. Saturated pool: skip silently.
    pub fn spawn(
        &mut self,
        rng: &mut Pcg32,
        vehicle_forward: f64,
        difficulty_ramp: f64,
        tuning: &ObstacleTuning,
    ) -> Option<SpawnInfo> {
        let index = self.slots.iter().position(|o| !o.active)?;

        let lane = *tuning.lanes.choose(rng)?;
        let behind = rng.random_bool(0.5);
        let distance = if behind {
            tuning.behind_min_distance + rng.random::<f64>() * tuning.behind_distance_range
        } else {
            tuning.ahead_min_distance + rng.random::<f64>() * tuning.ahead_distance_range
        };
        let forward_position = if behind {
            vehicle_forward - distance
        } else {
            vehicle_forward + distance
        };

        let raw_speed = tuning.base_speed + difficulty_ramp + rng.random::<f64>() * tuning.speed_jitter;
        let speed = if behind {
            raw_speed + tuning.pursuit_bonus
        } else {
            raw_speed * tuning.ahead_speed_factor
        };
        let kind = *ObstacleKind::ALL.choose(rng)?;

        let slot = &mut self.slots[index];
        slot.active = true;
        slot.lane = lane;
        slot.forward_position = forward_position;
        slot.assigned_speed = speed;
        slot.kind = kind;

        Some(SpawnInfo {
            index,
            lane,
            behind,
            distance,
            speed,
        })
    }

    /// Park a slot. Returns false if it was already inactive (or out of range).
    pub fn recycle(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.active => {
                *slot = Obstacle::default();
                true
            }
            _ => false,
        }
    }

    /// Move every active obstacle along the track axis
    pub fn advance(&mut self, dt: f64) {
        for obstacle in self.slots.iter_mut().filter(|o| o.active) {
            obstacle.forward_position += obstacle.assigned_speed * dt;
        }
    }

    /// Recycle obstacles that drifted out of interaction range; returns how many
    pub fn recycle_distant(&mut self, vehicle_forward: f64, tuning: &ObstacleTuning) -> usize {
        let stale: Vec<usize> = self
            .iter_active()
            .filter(|(_, o)| {
                let offset = o.forward_position - vehicle_forward;
                offset > tuning.recycle_ahead || offset < -tuning.recycle_behind
            })
            .map(|(i, _)| i)
            .collect();
        for &index in &stale {
            self.recycle(index);
        }
        stale.len()
    }

    /// Park everything and restart the spawn timer
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            self.recycle(index);
        }
        self.spawn_timer = 0.0;
    }
}
