//! # ODV telemetry
//!
//! One flat record per control cycle, written to the session's csv archive.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{AutoMode, MotionController};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdvTm {
    /// Session time of the record.
    ///
    /// Units: seconds
    pub time_s: f64,

    pub fine_x: i32,
    pub fine_y: i32,
    pub tile_x: i32,
    pub tile_y: i32,

    pub is_homed: bool,
    pub has_load: bool,

    /// Name of the current autonomous leg, empty in manual
    pub auto_mode: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OdvTm {
    pub fn new(time_s: f64, ctrl: &MotionController, mode: Option<AutoMode>) -> Self {
        let fine = ctrl.fine_position();
        let tile = ctrl.tile_position();

        Self {
            time_s,
            fine_x: fine.x,
            fine_y: fine.y,
            tile_x: tile.x,
            tile_y: tile.y,
            is_homed: ctrl.is_homed(),
            has_load: ctrl.has_load(),
            auto_mode: mode.map(|m| format!("{:?}", m)).unwrap_or_default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
