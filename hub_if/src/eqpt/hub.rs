//! # Hub Equipment Interface
//!
//! The hub itself: the source of motors on its ports, its status light and its orientation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::motor::{DeviceError, MotorHandle, Port, PositiveDirection};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A programmable hub with motor ports, a status light and an IMU.
pub trait Hub {
    /// Open the motor connected to `port`.
    ///
    /// Returns `DeviceError::NoMotor` if nothing is connected to the port, so callers can report
    /// exactly which port is missing its motor.
    fn motor(
        &mut self,
        port: Port,
        positive_direction: PositiveDirection,
    ) -> Result<Box<dyn MotorHandle>, DeviceError>;

    /// The hub's status light.
    fn light(&mut self) -> &mut dyn StatusLight;

    /// Which side of the hub currently faces up.
    fn up_side(&self) -> Side;
}

/// A single colour status light.
pub trait StatusLight {
    fn on(&mut self, color: Color);

    fn off(&mut self) {
        self.on(Color::None)
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Light colours used by the vehicle software.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum Color {
    None,
    Red,
    Green,
    Orange,
    White,
}

/// Sides of the hub as reported by its IMU.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum Side {
    Top,
    Bottom,
    Front,
    Back,
    Left,
    Right,
}
