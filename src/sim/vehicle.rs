//! Player vehicle kinematics
//!
//! Not a rigid-body model: forward speed is a clamped scalar and lateral motion
//! is either button-driven (fixed lateral speed with geometric decay) or
//! wheel-driven (heading eased toward the steer axis at a bounded rate).

use serde::{Deserialize, Serialize};

use super::tick::TickInput;
use crate::approach;
use crate::tuning::VehicleTuning;

/// How steering input is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlScheme {
    /// Left/right buttons set a fixed lateral speed
    #[default]
    Buttons,
    /// Continuous steer axis drives a bounded heading
    Wheel,
}

impl ControlScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::Buttons => "Buttons",
            ControlScheme::Wheel => "Wheel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buttons" | "lanes" | "keys" => Some(ControlScheme::Buttons),
            "wheel" | "steering" => Some(ControlScheme::Wheel),
            _ => None,
        }
    }
}

/// The player-controlled car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Meters traveled along the track axis
    pub forward_position: f64,
    /// Offset from the road centerline (+ is right)
    pub lateral_position: f64,
    pub lateral_velocity: f64,
    pub forward_velocity: f64,
    /// Wheel scheme only (radians, + is right)
    pub heading: f64,
    pub collision_count: u32,
    pub invulnerable: bool,
    pub invulnerability_remaining: f64,
}

impl Vehicle {
    pub fn new(tuning: &VehicleTuning) -> Self {
        Self {
            forward_position: 0.0,
            lateral_position: 0.0,
            lateral_velocity: 0.0,
            forward_velocity: tuning.base_velocity,
            heading: 0.0,
            collision_count: 0,
            invulnerable: false,
            invulnerability_remaining: 0.0,
        }
    }

    /// Back to start-of-run defaults, with a fresh invulnerability window
    pub fn reset(&mut self, tuning: &VehicleTuning, invulnerability: f64) {
        *self = Self::new(tuning);
        self.grant_invulnerability(invulnerability);
    }

    pub fn grant_invulnerability(&mut self, seconds: f64) {
        self.invulnerable = seconds > 0.0;
        self.invulnerability_remaining = seconds.max(0.0);
    }

    /// Count down the grace window; returns true while still invulnerable
    pub fn tick_invulnerability(&mut self, dt: f64) -> bool {
        if self.invulnerable {
            self.invulnerability_remaining -= dt;
            if self.invulnerability_remaining <= 0.0 {
                self.invulnerability_remaining = 0.0;
                self.invulnerable = false;
                log::debug!("Invulnerability window ended");
            }
        }
        self.invulnerable
    }
}

/// Turns per-tick input flags into vehicle motion
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleController {
    pub scheme: ControlScheme,
}

impl VehicleController {
    pub fn new(scheme: ControlScheme) -> Self {
        Self { scheme }
    }

    /// Integrate one fixed step of input
    pub fn update(&self, vehicle: &mut Vehicle, input: &TickInput, tuning: &VehicleTuning, dt: f64) {
        self.update_forward(vehicle, input, tuning, dt);
        match self.scheme {
            ControlScheme::Buttons => Self::update_lateral_buttons(vehicle, input, tuning),
            ControlScheme::Wheel => Self::update_lateral_wheel(vehicle, input, tuning, dt),
        }

        vehicle.forward_position += vehicle.forward_velocity * dt;
        vehicle.lateral_position += vehicle.lateral_velocity * dt;

        // Road edges
        let edge = tuning.road_half_width;
        if vehicle.lateral_position.abs() > edge {
            vehicle.lateral_position = vehicle.lateral_position.clamp(-edge, edge);
            if vehicle.lateral_velocity * vehicle.lateral_position > 0.0 {
                vehicle.lateral_velocity = 0.0;
            }
        }
    }

    /// Exactly one branch fires: accelerate, else decelerate, else ease to base
    fn update_forward(&self, vehicle: &mut Vehicle, input: &TickInput, t: &VehicleTuning, dt: f64) {
        let v = vehicle.forward_velocity;
        vehicle.forward_velocity = if input.accelerate {
            (v + t.accel_rate * dt).min(t.max_velocity)
        } else if input.decelerate {
            (v - t.decel_rate * dt).max(t.min_velocity)
        } else {
            approach(v, t.base_velocity, t.idle_rate * dt)
        };
        vehicle.forward_velocity = vehicle.forward_velocity.clamp(t.min_velocity, t.max_velocity);
    }

    fn update_lateral_buttons(vehicle: &mut Vehicle, input: &TickInput, t: &VehicleTuning) {
        match (input.steer_left, input.steer_right) {
            (true, false) => vehicle.lateral_velocity = -t.lateral_speed,
            (false, true) => vehicle.lateral_velocity = t.lateral_speed,
            _ => {
                vehicle.lateral_velocity *= t.lateral_decay;
                if vehicle.lateral_velocity.abs() < t.lateral_epsilon {
                    vehicle.lateral_velocity = 0.0;
                }
            }
        }
    }

    fn update_lateral_wheel(vehicle: &mut Vehicle, input: &TickInput, t: &VehicleTuning, dt: f64) {
        let target = input.steer_axis.clamp(-1.0, 1.0) * t.max_steer_angle;
        vehicle.heading = approach(vehicle.heading, target, t.steer_response * dt)
            .clamp(-t.max_steer_angle, t.max_steer_angle);
        vehicle.lateral_velocity = vehicle.forward_velocity * vehicle.heading.sin();
        if vehicle.lateral_velocity.abs() < t.lateral_epsilon && target == 0.0 {
            vehicle.lateral_velocity = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP;

    fn held(input: TickInput, seconds: f64, vehicle: &mut Vehicle, scheme: ControlScheme) {
        let tuning = VehicleTuning::default();
        let controller = VehicleController::new(scheme);
        let ticks = (seconds / STEP).round() as usize;
        for _ in 0..ticks {
            controller.update(vehicle, &input, &tuning, STEP);
        }
    }

    #[test]
    fn test_accelerate_one_second() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        assert!((vehicle.forward_velocity - 6.944).abs() < 1e-9);
        let input = TickInput {
            accelerate: true,
            ..Default::default()
        };
        held(input, 1.0, &mut vehicle, ControlScheme::Buttons);
        assert!((vehicle.forward_velocity - 11.944).abs() < 1e-6);
    }

    #[test]
    fn test_accelerate_clamps_at_max() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        let input = TickInput {
            accelerate: true,
            ..Default::default()
        };
        held(input, 30.0, &mut vehicle, ControlScheme::Buttons);
        assert_eq!(vehicle.forward_velocity, 44.444);
    }

    #[test]
    fn test_accelerate_wins_over_decelerate() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        let input = TickInput {
            accelerate: true,
            decelerate: true,
            ..Default::default()
        };
        held(input, 0.2, &mut vehicle, ControlScheme::Buttons);
        assert!(vehicle.forward_velocity > 6.944);
    }

    #[test]
    fn test_decelerate_floors_at_min() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        let input = TickInput {
            decelerate: true,
            ..Default::default()
        };
        held(input, 5.0, &mut vehicle, ControlScheme::Buttons);
        assert_eq!(vehicle.forward_velocity, 2.778);
    }

    #[test]
    fn test_idle_eases_to_base_without_overshoot() {
        let tuning = VehicleTuning::default();
        let mut vehicle = Vehicle::new(&tuning);
        vehicle.forward_velocity = 6.97;
        held(TickInput::default(), 0.1, &mut vehicle, ControlScheme::Buttons);
        assert!((vehicle.forward_velocity - tuning.base_velocity).abs() < 1e-12);

        vehicle.forward_velocity = 20.0;
        held(TickInput::default(), 1.0, &mut vehicle, ControlScheme::Buttons);
        assert!((vehicle.forward_velocity - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_lateral_decay_snaps_to_zero() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        let input = TickInput {
            steer_right: true,
            ..Default::default()
        };
        held(input, 0.1, &mut vehicle, ControlScheme::Buttons);
        assert_eq!(vehicle.lateral_velocity, 6.0);

        held(TickInput::default(), 2.0, &mut vehicle, ControlScheme::Buttons);
        assert_eq!(vehicle.lateral_velocity, 0.0);
        assert!(vehicle.lateral_position > 0.0);
    }

    #[test]
    fn test_lateral_position_clamped_to_road() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        let input = TickInput {
            steer_left: true,
            ..Default::default()
        };
        held(input, 5.0, &mut vehicle, ControlScheme::Buttons);
        assert_eq!(vehicle.lateral_position, -4.5);
    }

    #[test]
    fn test_wheel_heading_rate_is_bounded() {
        let tuning = VehicleTuning::default();
        let mut vehicle = Vehicle::new(&tuning);
        let controller = VehicleController::new(ControlScheme::Wheel);
        let input = TickInput {
            steer_axis: 1.0,
            ..Default::default()
        };
        controller.update(&mut vehicle, &input, &tuning, STEP);
        assert!((vehicle.heading - tuning.steer_response * STEP).abs() < 1e-12);

        // Full lock after ~0.23s, still well inside the road
        held(input, 0.3, &mut vehicle, ControlScheme::Wheel);
        assert!((vehicle.heading - tuning.max_steer_angle).abs() < 1e-12);
        let expected = vehicle.forward_velocity * tuning.max_steer_angle.sin();
        assert!((vehicle.lateral_velocity - expected).abs() < 1e-12);
        assert!(vehicle.lateral_position < tuning.road_half_width);
    }

    #[test]
    fn test_wheel_stops_at_road_edge() {
        let tuning = VehicleTuning::default();
        let mut vehicle = Vehicle::new(&tuning);
        let input = TickInput {
            steer_axis: 1.0,
            ..Default::default()
        };
        held(input, 5.0, &mut vehicle, ControlScheme::Wheel);
        assert_eq!(vehicle.lateral_position, tuning.road_half_width);
        assert_eq!(vehicle.lateral_velocity, 0.0);
        assert!((vehicle.heading - tuning.max_steer_angle).abs() < 1e-12);
    }

    #[test]
    fn test_invulnerability_countdown() {
        let mut vehicle = Vehicle::new(&VehicleTuning::default());
        vehicle.grant_invulnerability(0.05);
        assert!(vehicle.tick_invulnerability(STEP));
        assert!(vehicle.tick_invulnerability(STEP));
        assert!(!vehicle.tick_invulnerability(STEP));
        assert_eq!(vehicle.invulnerability_remaining, 0.0);
    }

    #[test]
    fn test_control_scheme_from_str() {
        assert_eq!(ControlScheme::from_str("WHEEL"), Some(ControlScheme::Wheel));
        assert_eq!(ControlScheme::from_str("lanes"), Some(ControlScheme::Buttons));
        assert_eq!(ControlScheme::from_str("joystick"), None);
    }
}
