//! Held input flags
//!
//! Event handlers (keyboard, touch widgets, gamepad) write plain flags here
//! between frames; the frame driver takes one `TickInput` snapshot per tick.

use crate::sim::TickInput;

/// Logical controls the widgets/keys map onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Accelerate,
    Decelerate,
    SteerLeft,
    SteerRight,
}

impl Control {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Control::Accelerate),
            "ArrowDown" | "s" | "S" => Some(Control::Decelerate),
            "ArrowLeft" | "a" | "A" => Some(Control::SteerLeft),
            "ArrowRight" | "d" | "D" => Some(Control::SteerRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub accelerate: bool,
    pub decelerate: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    /// Analog steer axis (wheel widget / gamepad), overrides the buttons when set
    pub steer_axis: Option<f64>,
    pub autopilot: bool,
}

impl InputState {
    pub fn set(&mut self, control: Control, pressed: bool) {
        match control {
            Control::Accelerate => self.accelerate = pressed,
            Control::Decelerate => self.decelerate = pressed,
            Control::SteerLeft => self.steer_left = pressed,
            Control::SteerRight => self.steer_right = pressed,
        }
    }

    /// Handle a key event; returns true if the key is bound
    pub fn handle_key(&mut self, key: &str, pressed: bool) -> bool {
        match Control::from_key(key) {
            Some(control) => {
                self.set(control, pressed);
                true
            }
            None => false,
        }
    }

    pub fn set_steer_axis(&mut self, axis: Option<f64>) {
        self.steer_axis = axis.filter(|a| a.is_finite()).map(|a| a.clamp(-1.0, 1.0));
    }

    /// Drop every held control (window blur, tab hidden)
    pub fn release_all(&mut self) {
        let autopilot = self.autopilot;
        *self = Self {
            autopilot,
            ..Default::default()
        };
    }

    /// Snapshot for one tick
    pub fn snapshot(&self) -> TickInput {
        let button_axis = match (self.steer_left, self.steer_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        TickInput {
            accelerate: self.accelerate,
            decelerate: self.decelerate,
            steer_left: self.steer_left,
            steer_right: self.steer_right,
            steer_axis: self.steer_axis.unwrap_or(button_axis),
            autopilot: self.autopilot,
        }
    }
}
