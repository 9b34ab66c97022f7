//! Train kinematics
//!
//! A single train motor, on port A or else port B. The `+` and `-` buttons of either pad step
//! the speed up and down, the centre buttons stop the train. The speed is kept between presses.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use hub_if::eqpt::{Button, ButtonSet, DeviceError, Hub, MotorHandle, Port, PositiveDirection};
use log::{debug, info};

use super::{params::direction, TrainParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Train {
    params: TrainParams,
    motor: Box<dyn MotorHandle>,

    /// Units: percent
    speed_pct: i32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Train {
    /// Open the train motor on port A, falling back to port B.
    ///
    /// Reports a missing motor on port A if neither port has one.
    pub fn new(params: &TrainParams, hub: &mut dyn Hub) -> Result<Self, DeviceError> {
        let dir_a = direction(PositiveDirection::Clockwise, params.reverse_motor_a);
        let dir_b = direction(PositiveDirection::Clockwise, params.reverse_motor_b);

        let motor = match hub.motor(Port::A, dir_a) {
            Ok(m) => m,
            Err(DeviceError::NoMotor(_)) => hub
                .motor(Port::B, dir_b)
                .map_err(|_| DeviceError::NoMotor(Port::A))?,
            Err(e) => return Err(e),
        };
        info!("Found train motor on {}", motor.port());

        Ok(Self {
            params: params.clone(),
            motor,
            speed_pct: 0,
        })
    }

    /// Step the speed on newly pressed buttons.
    pub fn proc(&mut self, newly_pressed: ButtonSet) -> Result<(), DeviceError> {
        let speed = if newly_pressed.contains(Button::Left) || newly_pressed.contains(Button::Right)
        {
            0
        } else if newly_pressed.contains(Button::LeftPlus)
            || newly_pressed.contains(Button::RightPlus)
        {
            self.step_up()
        } else if newly_pressed.contains(Button::LeftMinus)
            || newly_pressed.contains(Button::RightMinus)
        {
            self.step_down()
        } else {
            self.speed_pct
        };

        if speed != self.speed_pct {
            debug!("Train speed {}% -> {}%", self.speed_pct, speed);
            self.speed_pct = speed;
            self.motor.set_duty_cycle(speed)?;
        }

        Ok(())
    }

    pub fn stop_all(&mut self) -> Result<(), DeviceError> {
        self.speed_pct = 0;
        self.motor.set_duty_cycle(0)
    }

    pub fn speed_pct(&self) -> i32 {
        self.speed_pct
    }

    fn step_up(&self) -> i32 {
        let p = &self.params;

        let mut speed = if self.speed_pct == 0 {
            p.min_speed_pct
        } else {
            self.speed_pct + p.speed_step_pct
        };

        // Snap to stopped when slowing down through the dead zone
        if speed < 0 && speed > -p.min_speed_pct {
            speed = 0;
        }

        speed.min(p.max_speed_pct)
    }

    fn step_down(&self) -> i32 {
        let p = &self.params;

        let mut speed = if self.speed_pct == 0 {
            -p.min_speed_pct
        } else {
            self.speed_pct - p.speed_step_pct
        };

        if speed > 0 && speed < p.min_speed_pct {
            speed = 0;
        }

        speed.max(-p.max_speed_pct)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
