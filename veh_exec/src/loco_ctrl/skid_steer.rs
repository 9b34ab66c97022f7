//! Skid steer kinematics
//!
//! One motor per side. Each side is driven by its own pad of the remote and only runs while a
//! button is held. When the vehicle flips over the sides swap so that the controls still feel
//! the same to the driver.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use hub_if::eqpt::{
    Button, ButtonSet, DeviceError, Hub, MotorHandle, Port, PositiveDirection, Side,
};
use log::info;

use super::{params::direction, SkidSteerParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct SkidSteer {
    drive_duty_pct: i32,

    /// Motor on the left side when the hub is the right way up
    left: Box<dyn MotorHandle>,
    left_dir: PositiveDirection,

    /// Motor on the right side when the hub is the right way up
    right: Box<dyn MotorHandle>,
    right_dir: PositiveDirection,

    flipped: bool,
    last_side: Option<Side>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl SkidSteer {
    pub fn new(params: &SkidSteerParams, hub: &mut dyn Hub) -> Result<Self, DeviceError> {
        let (left_port, right_port) = if params.swap_motor_sides {
            (Port::B, Port::A)
        } else {
            (Port::A, Port::B)
        };
        let left_dir = direction(PositiveDirection::Counterclockwise, params.reverse_left_motor);
        let right_dir = direction(PositiveDirection::Clockwise, params.reverse_right_motor);

        let mut ss = Self {
            drive_duty_pct: params.drive_duty_pct,
            left: hub.motor(left_port, left_dir)?,
            left_dir,
            right: hub.motor(right_port, right_dir)?,
            right_dir,
            flipped: false,
            last_side: None,
        };
        ss.stop_all()?;

        Ok(ss)
    }

    /// Swap the sides if the hub has turned over since the last call.
    pub fn handle_flip(&mut self, up_side: Side) {
        if self.last_side == Some(up_side) {
            return;
        }
        self.last_side = Some(up_side);

        match up_side {
            Side::Top => {
                info!("Top side up");
                self.flipped = false;
            }
            Side::Bottom => {
                info!("Bottom side up, swapping sides");
                self.flipped = true;
            }
            _ => (),
        }
    }

    pub fn proc(&mut self, pressed: ButtonSet) -> Result<(), DeviceError> {
        if pressed.is_empty() || pressed.contains(Button::Left) || pressed.contains(Button::Right)
        {
            return self.stop_all();
        }

        let d = self.drive_duty_pct;
        let side_duty = |plus: Button, minus: Button| {
            if pressed.contains(minus) {
                -d
            } else if pressed.contains(plus) {
                d
            } else {
                0
            }
        };
        let left_duty = side_duty(Button::LeftPlus, Button::LeftMinus);
        let right_duty = side_duty(Button::RightPlus, Button::RightMinus);

        if self.flipped {
            // Each motor now drives the other side, so correct for the direction it was opened
            // with
            let k = self.left_dir.sign() * self.right_dir.sign();
            self.right.set_duty_cycle(left_duty * k)?;
            self.left.set_duty_cycle(right_duty * k)?;
        } else {
            self.left.set_duty_cycle(left_duty)?;
            self.right.set_duty_cycle(right_duty)?;
        }

        Ok(())
    }

    pub fn stop_all(&mut self) -> Result<(), DeviceError> {
        self.left.set_duty_cycle(0)?;
        self.right.set_duty_cycle(0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
