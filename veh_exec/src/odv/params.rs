//! ODV parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hub_if::eqpt::{Port, PositiveDirection};
use serde::Deserialize;

use super::{Direction, MAX_MOTOR_ROT_SPEED};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OdvParams {
    // ---- EQUIPMENT ----
    /// Port of the motor driving the x (East/West) axis
    pub x_motor_port: Port,

    /// Port of the motor driving the y (North/South) axis
    pub y_motor_port: Port,

    pub x_motor_direction: PositiveDirection,

    pub y_motor_direction: PositiveDirection,

    // ---- DRIVING ----
    /// Duty cycle used while a direction button is held.
    ///
    /// Units: percent
    pub drive_duty_pct: i32,

    /// Axis speed when driving to a tile.
    ///
    /// Units: degrees/second
    pub nav_speed_degs: i32,

    // ---- GRID RULES ----
    /// Directions in which the vehicle may enter the home tile. It leaves home in the reverse
    /// of these.
    pub home_entry_directions: Vec<Direction>,

    /// Direction the vehicle must be moving for the load actuation to work.
    pub load_approach_direction: Direction,

    /// Direction the vehicle must be moving for the unload actuation to work.
    pub unload_approach_direction: Direction,

    // ---- CHOREOGRAPHY ----
    /// Pause after each homing step.
    ///
    /// Units: milliseconds
    pub homing_pause_ms: u64,

    /// Pause after arriving on the load/unload tile before actuating.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,

    /// How far the actuation axis moves past the tile centre to grab or release a load.
    ///
    /// Units: degrees
    pub actuation_offset_deg: i32,

    /// How long the actuation offset is held.
    ///
    /// Units: milliseconds
    pub actuation_hold_ms: u64,

    // ---- AUTO DRIVE ----
    /// Time without a remote button press before an autonomous cycle starts, 0 disables
    /// autonomous driving.
    ///
    /// Units: seconds
    pub auto_drive_timeout_s: f64,

    /// Drive back to the home tile after unloading.
    pub return_home: bool,

    /// Hand back to manual and re-home after every completed autonomous cycle.
    pub rehome_every_cycle: bool,

    /// Save a report of every planned path to the session directory.
    pub save_path_reports: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for OdvParams {
    fn default() -> Self {
        Self {
            x_motor_port: Port::A,
            y_motor_port: Port::C,
            x_motor_direction: PositiveDirection::Counterclockwise,
            y_motor_direction: PositiveDirection::Clockwise,
            drive_duty_pct: 50,
            nav_speed_degs: MAX_MOTOR_ROT_SPEED,
            home_entry_directions: vec![Direction::West, Direction::NorthWest],
            load_approach_direction: Direction::West,
            unload_approach_direction: Direction::East,
            homing_pause_ms: 200,
            settle_ms: 500,
            actuation_offset_deg: 240,
            actuation_hold_ms: 2000,
            auto_drive_timeout_s: 0.0,
            return_home: true,
            rehome_every_cycle: true,
            save_path_reports: true,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_use_defaults() {
        let params: OdvParams = util::params::parse(
            r#"
            y_motor_port = "B"
            auto_drive_timeout_s = 30.0
            home_entry_directions = ["West"]
            rehome_every_cycle = false
            "#,
        )
        .unwrap();

        assert_eq!(params.x_motor_port, Port::A);
        assert_eq!(params.y_motor_port, Port::B);
        assert_eq!(params.auto_drive_timeout_s, 30.0);
        assert_eq!(params.home_entry_directions, vec![Direction::West]);
        assert!(!params.rehome_every_cycle);
        assert!(params.return_home);
        assert_eq!(params.load_approach_direction, Direction::West);
    }
}
