//! # Hub interface crate.
//!
//! Provides all common equipment interfaces for the vehicle software: motors, the handheld
//! remote, the hub status light and orientation, and blocking delays. Hardware backends and the
//! simulation both implement these traits, so the control code never touches a concrete device.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and identifier definitions for equipment (motors, remote, light)
pub mod eqpt;

/// Blocking waits used by choreographed sequences
pub mod time;
