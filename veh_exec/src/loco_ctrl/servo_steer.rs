//! Servo steer kinematics
//!
//! A drive motor on port A and a position controlled steering motor on port B. The left pad
//! drives forwards and backwards, the right pad steers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use hub_if::eqpt::{
    Button, ButtonSet, DeviceError, Hub, MotorHandle, Port, PositiveDirection, StopBehavior,
};
use log::info;

use super::{params::direction, ServoSteerParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct ServoSteer {
    params: ServoSteerParams,
    drive: Box<dyn MotorHandle>,
    steering: Box<dyn MotorHandle>,

    /// Last commanded steering angle
    steer_target_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ServoSteer {
    /// Open both motors and calibrate the steering.
    pub fn new(params: &ServoSteerParams, hub: &mut dyn Hub) -> Result<Self, DeviceError> {
        let drive = hub.motor(
            Port::A,
            direction(PositiveDirection::Counterclockwise, params.reverse_drive_motor),
        )?;
        info!("Found drive motor on {}", Port::A);

        let steering = hub.motor(
            Port::B,
            direction(PositiveDirection::Clockwise, params.reverse_steering_motor),
        )?;
        info!("Found steering motor on {}", Port::B);

        let mut ss = Self {
            params: params.clone(),
            drive,
            steering,
            steer_target_deg: 0,
        };
        ss.calibrate_steering()?;
        ss.stop_all()?;

        Ok(ss)
    }

    /// Find both steering end stops and set the zero angle half way between them.
    pub fn calibrate_steering(&mut self) -> Result<(), DeviceError> {
        let speed = self.params.steer_speed_degs;
        let duty = self.params.calibration_duty_pct;

        info!("Setting steering limits");
        let left_end = self.steering.run_until_stalled(-speed, duty)?;
        let right_end = self.steering.run_until_stalled(speed, duty)?;
        self.steering.reset_angle((right_end - left_end) / 2)?;

        info!("Centering steering");
        self.steering.run_to_angle(0, speed, StopBehavior::Hold)?;
        self.steer_target_deg = 0;

        Ok(())
    }

    pub fn proc(&mut self, pressed: ButtonSet) -> Result<(), DeviceError> {
        if pressed.is_empty() || pressed.contains(Button::Left) || pressed.contains(Button::Right)
        {
            return self.stop_all();
        }

        let d = self.params.drive_duty_pct;
        let drive_duty = if pressed.contains(Button::LeftPlus) {
            d
        } else if pressed.contains(Button::LeftMinus) {
            -d
        } else {
            0
        };
        self.drive.set_duty_cycle(drive_duty)?;

        let turn = self.params.turn_angle_deg;
        let steer_deg = if pressed.contains(Button::RightPlus) {
            turn
        } else if pressed.contains(Button::RightMinus) {
            -turn
        } else {
            0
        };
        self.steer_to(steer_deg)
    }

    /// Stop driving and centre the steering.
    pub fn stop_all(&mut self) -> Result<(), DeviceError> {
        self.drive.set_duty_cycle(0)?;
        self.steer_to(0)
    }

    fn steer_to(&mut self, angle_deg: i32) -> Result<(), DeviceError> {
        if angle_deg != self.steer_target_deg {
            self.steering
                .run_to_angle(angle_deg, self.params.steer_speed_degs, StopBehavior::Hold)?;
            self.steer_target_deg = angle_deg;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
