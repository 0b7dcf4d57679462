//! Vehicle vs obstacle collision detection
//!
//! Axis convention: x = lateral (+ right), y = up, z = forward along the track.
//! Both volumes are grown by a safety margin so near misses stay forgiving.

use glam::DVec3;

use super::obstacle::{Obstacle, ObstaclePool};
use super::vehicle::Vehicle;
use crate::assets::BoundingVolumes;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Grow every axis by `margin` on both sides
    pub fn expanded(&self, margin: f64) -> Self {
        let m = DVec3::splat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// 3-axis interval overlap (touching counts)
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

/// Vehicle volume at its current position
pub fn vehicle_box(vehicle: &Vehicle, volumes: &BoundingVolumes) -> BoundingBox {
    let he = volumes.vehicle_half_extents();
    let center = DVec3::new(vehicle.lateral_position, he.y, vehicle.forward_position);
    BoundingBox::from_center_half_extents(center, he)
}

/// Obstacle volume at its current position
pub fn obstacle_box(obstacle: &Obstacle, volumes: &BoundingVolumes) -> BoundingBox {
    let he = volumes.obstacle_half_extents(obstacle.kind);
    let center = DVec3::new(obstacle.lane, he.y, obstacle.forward_position);
    BoundingBox::from_center_half_extents(center, he)
}

/// A registered hit (the obstacle has already been recycled)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionHit {
    pub obstacle: usize,
    /// Vehicle collision count after this hit
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    pub margin: f64,
}

impl CollisionResolver {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Run one tick of collision tests.
    ///
    /// Counts down the invulnerability window first and does nothing else while
    /// it is open. Each overlapping obstacle is counted once and recycled
    /// immediately so the same contact cannot trigger again next tick.
    pub fn resolve(
        &self,
        vehicle: &mut Vehicle,
        pool: &mut ObstaclePool,
        volumes: &BoundingVolumes,
        dt: f64,
    ) -> Vec<CollisionHit> {
        if vehicle.tick_invulnerability(dt) {
            return Vec::new();
        }

        let car = vehicle_box(vehicle, volumes).expanded(self.margin);
        let overlapping: Vec<usize> = pool
            .iter_active()
            .filter(|(_, o)| car.overlaps(&obstacle_box(o, volumes).expanded(self.margin)))
            .map(|(i, _)| i)
            .collect();

        let mut hits = Vec::with_capacity(overlapping.len());
        for index in overlapping {
            if pool.recycle(index) {
                vehicle.collision_count += 1;
                log::debug!("Collision with obstacle {} (count {})", index, vehicle.collision_count);
                hits.push(CollisionHit {
                    obstacle: index,
                    count: vehicle.collision_count,
                });
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP;
    use crate::tuning::{ObstacleTuning, VehicleTuning};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Spawn one obstacle and pin it to the given lane/position
    fn pool_with_obstacle_at(lane: f64, forward: f64) -> ObstaclePool {
        let mut tuning = ObstacleTuning::default();
        tuning.lanes = vec![lane];
        let mut pool = ObstaclePool::new(4);
        let mut rng = Pcg32::seed_from_u64(1);
        let info = pool.spawn(&mut rng, forward, 0.0, &tuning).unwrap();
        assert!(pool.reposition(info.index, forward, info.speed));
        pool
    }

    #[test]
    fn test_box_overlap() {
        let a = BoundingBox::from_center_half_extents(DVec3::ZERO, DVec3::ONE);
        let b = BoundingBox::from_center_half_extents(DVec3::new(1.9, 0.0, 0.0), DVec3::ONE);
        let c = BoundingBox::from_center_half_extents(DVec3::new(2.4, 0.0, 0.0), DVec3::ONE);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        // Margin turns the near miss into a hit
        assert!(a.expanded(0.3).overlaps(&c.expanded(0.3)));
    }

    #[test]
    fn test_hit_counts_and_recycles() {
        let volumes = BoundingVolumes::default();
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        vehicle.forward_position = 100.0;
        let mut pool = pool_with_obstacle_at(0.0, 100.0);

        let resolver = CollisionResolver::new(0.3);
        let hits = resolver.resolve(&mut vehicle, &mut pool, &volumes, STEP);
        assert_eq!(hits, vec![CollisionHit { obstacle: 0, count: 1 }]);
        assert_eq!(pool.active_count(), 0);

        // Same contact cannot re-trigger
        let hits = resolver.resolve(&mut vehicle, &mut pool, &volumes, STEP);
        assert!(hits.is_empty());
        assert_eq!(vehicle.collision_count, 1);
    }

    #[test]
    fn test_other_lane_misses() {
        let volumes = BoundingVolumes::default();
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        vehicle.forward_position = 100.0;
        let mut pool = pool_with_obstacle_at(3.0, 100.0);
        let hits = CollisionResolver::new(0.3).resolve(&mut vehicle, &mut pool, &volumes, STEP);
        assert!(hits.is_empty());
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_invulnerable_short_circuits() {
        let volumes = BoundingVolumes::default();
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        vehicle.forward_position = 100.0;
        vehicle.grant_invulnerability(1.0);
        let mut pool = pool_with_obstacle_at(0.0, 100.0);
        let hits = CollisionResolver::new(0.3).resolve(&mut vehicle, &mut pool, &volumes, STEP);
        assert!(hits.is_empty());
        assert_eq!(vehicle.collision_count, 0);
        assert_eq!(pool.active_count(), 1);
    }
}
