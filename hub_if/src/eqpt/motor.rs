//! # Motor Equipment Interface
//!
//! A unified API for the motors attached to the hub ports, abstracting over the real devices and
//! the simulated ones.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest duty cycle magnitude a motor accepts, in percent.
pub const MAX_DUTY_PCT: i32 = 100;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for a single motor on a hub port.
///
/// Angles are in motor degrees and speeds in degrees/second. All motion commands which target an
/// angle block until the target is reached, matching the behaviour of the hub firmware.
pub trait MotorHandle {
    /// The port this motor is connected to.
    fn port(&self) -> Port;

    /// Run the motor continuously at the given duty cycle.
    ///
    /// ## Arguments
    /// - `duty_pct` - Duty cycle between -100 and +100. Values outside this range are rejected.
    fn set_duty_cycle(&mut self, duty_pct: i32) -> Result<(), DeviceError>;

    /// Run the motor to an absolute angle, blocking until the target is reached.
    ///
    /// `stop` decides what the motor does once there: `StopBehavior::None` keeps it turning so a
    /// following command in the same direction does not decelerate first.
    fn run_to_angle(
        &mut self,
        target_deg: i32,
        speed_degs: i32,
        stop: StopBehavior,
    ) -> Result<(), DeviceError>;

    /// Run the motor until it stalls against a mechanical stop, with the duty cycle limited to
    /// `duty_limit_pct`. Returns the angle at which it stalled.
    fn run_until_stalled(&mut self, speed_degs: i32, duty_limit_pct: i32) -> Result<i32, DeviceError>;

    /// The current angle of the motor shaft.
    fn angle(&self) -> i32;

    /// Redefine the current shaft angle as `angle_deg`.
    fn reset_angle(&mut self, angle_deg: i32) -> Result<(), DeviceError>;

    /// Stop the motor, letting it coast. Always safe to call.
    fn stop(&mut self) -> Result<(), DeviceError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motor ports on the hub.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Port {
    A,
    B,
    C,
    D,
}

/// The rotation direction considered positive for a motor.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum PositiveDirection {
    Clockwise,
    Counterclockwise,
}

/// What a motor does after reaching the target of a `run_to_angle` command.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum StopBehavior {
    /// Let the motor spin freely
    Coast,

    /// Passively resist rotation
    Brake,

    /// Actively hold the target angle
    Hold,

    /// Keep running at the commanded speed, used to chain moves in the same direction
    None,
}

/// Errors raised by equipment on the hub.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Motor needs to be connected to port {0}")]
    NoMotor(Port),

    #[error("Could not connect to the remote")]
    NoRemote,

    #[error("Duty cycle must be between -100 and 100, got {0}")]
    InvalidDutyCycle(i32),

    #[error("Motor on port {0} reported an error: {1}")]
    Motor(Port, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port.{:?}", self)
    }
}

impl PositiveDirection {
    /// The sign applied to commanded angles and speeds for this direction.
    pub fn sign(&self) -> i32 {
        match self {
            PositiveDirection::Clockwise => 1,
            PositiveDirection::Counterclockwise => -1,
        }
    }
}

/// Check a duty cycle is inside the range accepted by the motors.
pub fn validate_duty_cycle(duty_pct: i32) -> Result<i32, DeviceError> {
    if duty_pct.abs() > MAX_DUTY_PCT {
        return Err(DeviceError::InvalidDutyCycle(duty_pct));
    }

    Ok(duty_pct)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
