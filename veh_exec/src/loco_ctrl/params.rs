//! Parameters structures for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use hub_if::eqpt::PositiveDirection;
use serde::Deserialize;

use crate::odv::OdvParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for every vehicle kind, one table each. Only the table of the vehicle being driven
/// is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Params {
    pub skid_steer: SkidSteerParams,
    pub servo_steer: ServoSteerParams,
    pub train: TrainParams,
    pub odv: OdvParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkidSteerParams {
    /// Duty cycle of a side while its button is held.
    ///
    /// Units: percent
    pub drive_duty_pct: i32,

    /// Put the left motor on port B and the right motor on port A, for when the left and right
    /// remote buttons are backwards.
    pub swap_motor_sides: bool,

    /// Set if the left `+` button drives the left side backwards.
    pub reverse_left_motor: bool,

    /// Set if the right `+` button drives the right side backwards.
    pub reverse_right_motor: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServoSteerParams {
    /// Duty cycle of the drive motor while a left button is held.
    ///
    /// Units: percent
    pub drive_duty_pct: i32,

    /// Steering angle either side of centre.
    ///
    /// Units: degrees
    pub turn_angle_deg: i32,

    /// Units: degrees/second
    pub steer_speed_degs: i32,

    /// Duty cycle limit while finding the steering end stops.
    ///
    /// Units: percent
    pub calibration_duty_pct: i32,

    pub reverse_drive_motor: bool,

    pub reverse_steering_motor: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    /// Slowest non-zero speed, steps which land between zero and this snap to zero.
    ///
    /// Units: percent
    pub min_speed_pct: i32,

    /// Units: percent
    pub max_speed_pct: i32,

    /// Change in speed for each button press.
    ///
    /// Units: percent
    pub speed_step_pct: i32,

    /// Reverse the motor on port A
    pub reverse_motor_a: bool,

    /// Reverse the motor on port B, used when no motor is on port A
    pub reverse_motor_b: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for SkidSteerParams {
    fn default() -> Self {
        Self {
            drive_duty_pct: 80,
            swap_motor_sides: false,
            reverse_left_motor: false,
            reverse_right_motor: false,
        }
    }
}

impl Default for ServoSteerParams {
    fn default() -> Self {
        Self {
            drive_duty_pct: 80,
            turn_angle_deg: 45,
            steer_speed_degs: 200,
            calibration_duty_pct: 60,
            reverse_drive_motor: false,
            reverse_steering_motor: false,
        }
    }
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            min_speed_pct: 30,
            max_speed_pct: 80,
            speed_step_pct: 10,
            reverse_motor_a: false,
            reverse_motor_b: true,
        }
    }
}

/// Pick a motor's positive direction: `normal` unless `reverse` is set.
pub(crate) fn direction(normal: PositiveDirection, reverse: bool) -> PositiveDirection {
    match (normal, reverse) {
        (d, false) => d,
        (PositiveDirection::Clockwise, true) => PositiveDirection::Counterclockwise,
        (PositiveDirection::Counterclockwise, true) => PositiveDirection::Clockwise,
    }
}
