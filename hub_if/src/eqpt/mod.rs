//! # Equipment Interface
//!
//! This module defines the interfaces through which the control loop drives the equipment
//! attached to the hub.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod hub;
pub mod motor;
pub mod remote;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use hub::{Color, Hub, Side, StatusLight};
pub use motor::{DeviceError, MotorHandle, Port, PositiveDirection, StopBehavior};
pub use remote::{Button, ButtonParseError, ButtonSet, RemoteInput};
