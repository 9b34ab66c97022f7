//! # Simulation backends
//!
//! Stand-ins for the hub equipment, used when running on a development host and by the tests:
//!
//! - [`SimHub`] - a hub whose motors move along a travel limited axis, integrated by
//!   [`SimHub::step`],
//! - [`ScriptedRemote`] - a remote whose button presses come from a timed script,
//! - [`LogLight`] - a status light which logs its colour changes.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod hub;
mod remote;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hub_if::eqpt::Port;
use serde::Deserialize;

pub use self::{
    hub::{LogLight, SimHub, SimMotor},
    remote::ScriptedRemote,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Ports with a motor connected
    pub connected_ports: Vec<Port>,

    /// Travel of every simulated axis between its two end stops.
    ///
    /// Units: degrees
    pub travel_limit_deg: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            connected_ports: vec![Port::A, Port::B, Port::C],
            travel_limit_deg: 20_000,
        }
    }
}
