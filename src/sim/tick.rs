//! Fixed timestep simulation tick
//!
//! One call advances a racing session by exactly one step. Order within a
//! tick is fixed: vehicle, collisions, obstacle advance/recycle, spawn, score.
//! Collision testing sees the vehicle's updated position against obstacles'
//! pre-advance positions.

use super::collision::{CollisionHit, CollisionResolver};
use super::obstacle::SpawnInfo;
use super::state::SessionContext;
use super::vehicle::VehicleController;
use crate::tuning::Tuning;

/// Input flags for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub accelerate: bool,
    pub decelerate: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    /// Wheel scheme steer axis in [-1, 1] (+ is right)
    pub steer_axis: f64,
    /// Demo mode - the car drives itself
    pub autopilot: bool,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub hits: Vec<CollisionHit>,
    pub spawned: Option<SpawnInfo>,
    pub recycled: usize,
}

/// Advance the racing simulation by one fixed step
pub fn tick(
    ctx: &mut SessionContext,
    input: &TickInput,
    tuning: &Tuning,
    controller: &VehicleController,
    resolver: &CollisionResolver,
    dt: f64,
) -> TickReport {
    let input = if input.autopilot {
        autopilot_input(ctx, tuning)
    } else {
        input.clone()
    };

    ctx.time_ticks += 1;

    controller.update(&mut ctx.vehicle, &input, &tuning.vehicle, dt);

    let hits = resolver.resolve(&mut ctx.vehicle, &mut ctx.pool, &ctx.volumes, dt);

    ctx.pool.advance(dt);
    let recycled = ctx
        .pool
        .recycle_distant(ctx.vehicle.forward_position, &tuning.obstacles);

    let spawned = if ctx.pool.spawn_due(dt, tuning.obstacles.spawn_interval) {
        let ramp = ctx.score.ramp(tuning.obstacles.ramp_coefficient);
        let info = ctx.pool.spawn(
            &mut ctx.rng,
            ctx.vehicle.forward_position,
            ramp,
            &tuning.obstacles,
        );
        if info.is_none() {
            log::debug!("Obstacle pool saturated, skipping spawn");
        }
        info
    } else {
        None
    };

    ctx.score.update(ctx.vehicle.forward_position, dt);

    TickReport {
        hits,
        spawned,
        recycled,
    }
}

/// Track distance window (behind, ahead) the autopilot treats as a threat
const AUTOPILOT_LOOKBEHIND: f64 = 12.0;
const AUTOPILOT_LOOKAHEAD: f64 = 45.0;
/// Lateral slack before the autopilot bothers steering
const AUTOPILOT_DEADBAND: f64 = 0.25;

/// Pick the nearest clear lane and drive toward it
pub fn autopilot_input(ctx: &SessionContext, tuning: &Tuning) -> TickInput {
    let vehicle = &ctx.vehicle;
    let lanes = &tuning.obstacles.lanes;

    // Closest threat distance per lane (None = clear)
    let threat = |lane: f64| -> Option<f64> {
        ctx.pool
            .iter_active()
            .filter(|(_, o)| (o.lane - lane).abs() < 0.5)
            .map(|(_, o)| o.forward_position - vehicle.forward_position)
            .filter(|&offset| {
                (0.0..AUTOPILOT_LOOKAHEAD).contains(&offset)
                    || (-AUTOPILOT_LOOKBEHIND..0.0).contains(&offset)
            })
            .map(f64::abs)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    };

    let target = lanes
        .iter()
        .copied()
        .min_by(|&a, &b| {
            // Clear lanes first, then the farthest threat, then the nearest lane
            let key = |lane: f64| {
                let danger = threat(lane).map_or(0.0, |d| AUTOPILOT_LOOKAHEAD - d);
                danger * 10.0 + (lane - vehicle.lateral_position).abs()
            };
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0.0);

    let error = target - vehicle.lateral_position;
    let current_lane_blocked = threat(vehicle.lateral_position).is_some_and(|d| d < 15.0);

    TickInput {
        accelerate: !current_lane_blocked,
        decelerate: false,
        steer_left: error < -AUTOPILOT_DEADBAND,
        steer_right: error > AUTOPILOT_DEADBAND,
        steer_axis: (error / 2.0).clamp(-1.0, 1.0),
        autopilot: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP;
    use crate::sim::vehicle::ControlScheme;

    fn run(ctx: &mut SessionContext, tuning: &Tuning, input: &TickInput, ticks: usize) {
        let controller = VehicleController::new(ControlScheme::Buttons);
        let resolver = CollisionResolver::new(tuning.collision.margin);
        for _ in 0..ticks {
            tick(ctx, input, tuning, &controller, &resolver, STEP);
        }
    }

    #[test]
    fn test_tick_advances_vehicle_and_score() {
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(&tuning, 12345);
        ctx.begin_run(&tuning);
        run(&mut ctx, &tuning, &TickInput::default(), 50);
        assert_eq!(ctx.time_ticks, 50);
        assert!((ctx.score.elapsed - 1.0).abs() < 1e-9);
        assert!((ctx.score.distance - 6.944).abs() < 1e-6);
        assert_eq!(ctx.score.score, 6);
    }

    #[test]
    fn test_spawns_on_interval() {
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(&tuning, 12345);
        ctx.begin_run(&tuning);
        // 1.2s interval: 60 ticks -> exactly one spawn attempt
        run(&mut ctx, &tuning, &TickInput::default(), 60);
        assert_eq!(ctx.pool.active_count(), 1);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let mut a = SessionContext::new(&tuning, 99999);
        let mut b = SessionContext::new(&tuning, 99999);
        a.begin_run(&tuning);
        b.begin_run(&tuning);

        let inputs = [
            TickInput {
                accelerate: true,
                ..Default::default()
            },
            TickInput {
                steer_left: true,
                ..Default::default()
            },
            TickInput {
                autopilot: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for input in &inputs {
            run(&mut a, &tuning, input, 200);
            run(&mut b, &tuning, input, 200);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.vehicle, b.vehicle);
        assert_eq!(a.pool.slots(), b.pool.slots());
    }

    #[test]
    fn test_autopilot_leaves_blocked_lane() {
        let mut tuning = Tuning::default();
        tuning.obstacles.lanes = vec![-3.0, 0.0, 3.0];
        let mut ctx = SessionContext::new(&tuning, 5);
        ctx.begin_run(&tuning);

        // Park an obstacle 10m ahead in the center lane
        let mut spawn_tuning = tuning.obstacles.clone();
        spawn_tuning.lanes = vec![0.0];
        let info = ctx.pool.spawn(&mut ctx.rng, 0.0, 0.0, &spawn_tuning).unwrap();
        assert!(ctx.pool.reposition(info.index, 10.0, info.speed));

        let input = autopilot_input(&ctx, &tuning);
        assert!(input.steer_left || input.steer_right);
        assert!(!input.accelerate);
    }
}
