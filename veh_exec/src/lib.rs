//! # Vehicle library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the vehicle crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Timed run window, started and reset from the remote
pub mod countdown;

/// Global data store for the executable
pub mod data_store;

/// Error flash codes shown on the hub status light
pub mod diag;

/// Locomotion control module - converts remote input into motor demands for each vehicle kind
pub mod loco_ctrl;

/// Omni-directional vehicle - grid navigation, homing and autonomous load/unload cycles
pub mod odv;

/// Executable parameters
pub mod params;

/// Simulated hub and scripted remote
pub mod sim;
