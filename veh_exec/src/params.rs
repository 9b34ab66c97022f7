//! # Vehicle Executable Parameters
//!
//! This module provide parameters for the vehicle executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{countdown::CountdownParams, loco_ctrl::VehicleKind, sim::SimParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VehExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// The vehicle being driven
    pub vehicle: VehicleKind,

    /// Run without the remote. Only useful for vehicles which can drive themselves.
    #[serde(default)]
    pub remote_disabled: bool,

    /// Run window started from the remote. Ignored when the remote is disabled.
    #[serde(default)]
    pub countdown: CountdownParams,

    /// Simulated hub setup
    #[serde(default)]
    pub sim: SimParams,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_cycle_period_s() -> f64 {
    0.01
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
