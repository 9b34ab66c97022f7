//! # Omni-Directional Vehicle
//!
//! The ODV is a gantry with two perpendicular linear axes, each driven by one motor. It drives
//! over a coarse grid of tiles (see [`grid_map`]) while tracking its position on a finer grid
//! derived from the motor encoder angles.
//!
//! Coordinates: x grows towards the East, y grows towards the South, so North is `-y`.
//!
//! Each cycle [`Odv::proc`] will:
//!
//! 1. Run the homing cycle if the vehicle has not been homed yet (blocking),
//! 2. Refresh the fine position from the motor angles,
//! 3. Step the [`auto_mgr::AutoMgr`], which either drives one hop of an autonomous leg or hands
//!    the remote input back for manual driving,
//! 4. In manual mode, gate the requested move through the [`collision::CollisionChecker`] and
//!    command it, loading or unloading when parked squarely on the matching tile.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod auto_mgr;
pub mod collision;
pub mod grid_map;
pub mod motion_ctrl;
pub mod params;
pub mod path_finder;
pub mod pos_est;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt, sync::Arc};

use hub_if::{
    eqpt::{Button, ButtonSet, DeviceError, Hub, StopBehavior},
    time::Delay,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use self::{
    auto_mgr::{AutoMgr, AutoMode, AutoStepResult},
    collision::{CollisionChecker, MoveCheck},
    grid_map::{ConfigError, GridMap, GridTile},
    motion_ctrl::{MotionController, MotionError},
    params::OdvParams,
    path_finder::{Hop, Path, PathFinder, PathFinderError, PathFinderReport},
    tm::OdvTm,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of fine grid units along each side of a tile.
pub const FINE_GRID_SIZE: i32 = 10;

/// Side length of the vehicle in fine grid units.
pub const ODV_SIZE: i32 = 8;

/// Clearance subtracted from each side of the vehicle when checking collisions.
pub const FOOTPRINT_BUFFER: i32 = 1;

/// Motor rotation per fine grid unit, in degrees.
pub const GEAR_RATIO_TO_GRID: i32 = 80;

/// Maximum motor rotation speed, in degrees/second.
pub const MAX_MOTOR_ROT_SPEED: i32 = 1400;

/// Speed used when driving an axis into its end stop, in degrees/second.
pub const HOMING_MOTOR_ROT_SPEED: i32 = 200;

/// Duty cycle limit while homing, in percent.
pub const HOMING_DUTY: i32 = 35;

/// The grid layout the vehicle drives on.
///
/// `X` = wall, `#` = track, `H` = home, `L` = load, `U` = unload.
pub const DEFAULT_GRID: [&str; 3] = ["XL##XU", "H#X#X#", "XXX###"];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position of the vehicle on the fine grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinePosition {
    pub x: i32,
    pub y: i32,
}

/// Position of a tile on the coarse grid, as (column, row).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

/// The square occupied by the vehicle, anchored at its fine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub origin: FinePosition,
}

/// The omni-directional vehicle and all its navigation components.
pub struct Odv {
    grid: Arc<GridMap>,
    collision: CollisionChecker,
    path_finder: PathFinder,
    ctrl: MotionController,
    auto_mgr: AutoMgr,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Compass directions the vehicle can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// Corners of a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest = 0,
    NorthEast = 1,
    SouthEast = 2,
    SouthWest = 3,
}

#[derive(Debug, thiserror::Error)]
pub enum OdvError {
    #[error("Invalid grid")]
    Config(#[from] ConfigError),

    #[error("Could not open the axis motors")]
    Device(#[from] DeviceError),

    #[error("Motion failed")]
    Motion(#[from] MotionError),

    #[error("No route to the end of run tile")]
    Routing(#[from] PathFinderError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Odv {
    /// Build the vehicle on the given grid, opening both axis motors on the hub.
    pub fn new<S: AsRef<str>>(
        grid_lines: &[S],
        hub: &mut dyn Hub,
        delay: Box<dyn Delay>,
        params: &OdvParams,
    ) -> Result<Self, OdvError> {
        let grid = Arc::new(GridMap::load(grid_lines)?);
        info!(
            "Grid loaded ({}x{}), home {}, load {}, unload {}",
            grid.width(),
            grid.height(),
            grid.home(),
            grid.load_tile(),
            grid.unload()
        );

        let x_motor = hub.motor(params.x_motor_port, params.x_motor_direction)?;
        let y_motor = hub.motor(params.y_motor_port, params.y_motor_direction)?;

        Ok(Self {
            collision: CollisionChecker::new(grid.clone(), params),
            path_finder: PathFinder::new(grid.clone()),
            ctrl: MotionController::new(x_motor, y_motor, delay, grid.clone(), params),
            auto_mgr: AutoMgr::new(params),
            grid,
        })
    }

    /// Process one control cycle.
    pub fn proc(&mut self, pressed: ButtonSet, now_s: f64) -> Result<AutoStepResult, OdvError> {
        if !self.ctrl.is_homed() {
            self.ctrl.homing_cycle()?;
            info!(
                "Homed at tile {}:\n{}",
                self.ctrl.tile_position(),
                self.grid.display(Some(self.ctrl.tile_position()))
            );
        }

        self.ctrl.refresh_position();

        let result = self
            .auto_mgr
            .step(&mut self.ctrl, &self.path_finder, pressed, now_s)?;

        if result == AutoStepResult::Manual {
            self.drive_manual(pressed)?;
        }

        Ok(result)
    }

    /// Stop both axes.
    pub fn stop_all(&mut self) -> Result<(), OdvError> {
        self.ctrl.stop_all().map_err(OdvError::from)
    }

    /// Wind the vehicle down once the run's time is up.
    ///
    /// Any autonomous leg is abandoned. A carried load is taken to the unload tile and dropped,
    /// then the vehicle drives home and its homing is reset, so the next run starts by homing.
    /// An unhomed vehicle is only stopped, its position is unknown.
    pub fn end_of_run(&mut self, now_s: f64) -> Result<(), OdvError> {
        self.auto_mgr.abandon(now_s);
        self.ctrl.stop_all()?;

        if !self.ctrl.is_homed() {
            return Ok(());
        }

        self.ctrl.refresh_position();

        if self.ctrl.has_load() {
            info!("Run ended with a load, unloading");
            self.follow_path_to(self.grid.unload())?;
            self.ctrl.do_unload()?;
        }

        info!("Run ended, returning home");
        self.follow_path_to(self.grid.home())?;
        self.ctrl.stop_all()?;
        self.ctrl.reset_homing();

        Ok(())
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn motion_ctrl(&self) -> &MotionController {
        &self.ctrl
    }

    pub fn auto_mode(&self) -> Option<AutoMode> {
        self.auto_mgr.mode()
    }

    /// True if the vehicle drives itself after the remote has been idle.
    pub fn auto_drive_enabled(&self) -> bool {
        self.auto_mgr.is_enabled()
    }

    /// Telemetry record for this cycle.
    pub fn tm(&self, time_s: f64) -> OdvTm {
        OdvTm::new(time_s, &self.ctrl, self.auto_mgr.mode())
    }

    /// Drive hop by hop along the shortest path to `goal`, starting from the centre of the
    /// current tile.
    fn follow_path_to(&mut self, goal: TilePosition) -> Result<(), OdvError> {
        let start = self.ctrl.tile_position();
        let path = self.path_finder.shortest_path(start, goal)?;

        self.ctrl.navigate_to_tile(start, StopBehavior::Hold)?;

        for (i, hop) in path.iter().enumerate() {
            let stop = if path.continues_straight(i) {
                StopBehavior::None
            } else {
                StopBehavior::Hold
            };
            self.ctrl.navigate_to_tile(hop.tile, stop)?;
        }

        Ok(())
    }

    /// Bang-bang manual driving: a button must be held for the vehicle to move.
    fn drive_manual(&mut self, pressed: ButtonSet) -> Result<(), OdvError> {
        let direction = match Direction::from_buttons(&pressed) {
            Some(d) => d,
            None => return self.stop_all(),
        };

        let check = self
            .collision
            .can_move_in_direction(&self.ctrl.footprint(), direction);

        if check.can_load && !self.ctrl.has_load() {
            info!("Parked on the load tile, loading");
            self.ctrl.do_load()?;
        } else if check.can_unload && self.ctrl.has_load() {
            info!("Parked on the unload tile, unloading");
            self.ctrl.do_unload()?;
        } else if check.can_move {
            self.ctrl.move_manual(direction)?;
        } else {
            debug!(
                "Move {:?} from {:?} denied",
                direction,
                self.ctrl.fine_position()
            );
            self.ctrl.stop_all()?;
        }

        Ok(())
    }
}

impl Direction {
    /// All directions, clockwise from North.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The (x, y) step of this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    /// Corners of the footprint that cross into a new tile first when moving this way.
    pub fn leading_corners(&self) -> &'static [Corner] {
        match self {
            Direction::North => &[Corner::NorthWest, Corner::NorthEast],
            Direction::NorthEast => &[Corner::NorthEast],
            Direction::East => &[Corner::NorthEast, Corner::SouthEast],
            Direction::SouthEast => &[Corner::SouthEast],
            Direction::South => &[Corner::SouthEast, Corner::SouthWest],
            Direction::SouthWest => &[Corner::SouthWest],
            Direction::West => &[Corner::SouthWest, Corner::NorthWest],
            Direction::NorthWest => &[Corner::NorthWest],
        }
    }

    /// Map the remote buttons to a direction.
    ///
    /// ```text
    ///            LEFT+ (N)
    /// RIGHT- (W)          RIGHT+ (E)
    ///            LEFT- (S)
    /// ```
    ///
    /// Pressing a left and a right button together gives the diagonal.
    pub fn from_buttons(pressed: &ButtonSet) -> Option<Direction> {
        let lp = pressed.contains(Button::LeftPlus);
        let lm = pressed.contains(Button::LeftMinus);
        let rp = pressed.contains(Button::RightPlus);
        let rm = pressed.contains(Button::RightMinus);

        match (lp, lm, rp, rm) {
            (true, _, true, _) => Some(Direction::NorthEast),
            (true, _, _, true) => Some(Direction::NorthWest),
            (_, true, true, _) => Some(Direction::SouthEast),
            (_, true, _, true) => Some(Direction::SouthWest),
            (true, _, _, _) => Some(Direction::North),
            (_, true, _, _) => Some(Direction::South),
            (_, _, true, _) => Some(Direction::East),
            (_, _, _, true) => Some(Direction::West),
            _ => None,
        }
    }
}

impl FinePosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position one fine unit away in `direction`.
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl TilePosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring tile in `direction`.
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Footprint {
    pub fn at(origin: FinePosition) -> Self {
        Self { origin }
    }

    /// Corner positions, indexed by [`Corner`].
    pub fn corners(&self) -> [FinePosition; 4] {
        let lo = FOOTPRINT_BUFFER;
        let hi = ODV_SIZE - FOOTPRINT_BUFFER;
        let o = self.origin;

        [
            FinePosition::new(o.x + lo, o.y + lo),
            FinePosition::new(o.x + hi, o.y + lo),
            FinePosition::new(o.x + hi, o.y + hi),
            FinePosition::new(o.x + lo, o.y + hi),
        ]
    }

    /// The footprint after moving one fine unit in `direction`.
    pub fn shifted(&self, direction: Direction) -> Self {
        Self::at(self.origin.step(direction))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimHub;
    use hub_if::{eqpt::Port, time::NoDelay};

    fn buttons(s: &str) -> ButtonSet {
        s.parse().unwrap()
    }

    fn sim_odv() -> (SimHub, Odv) {
        let mut hub = SimHub::new(&[Port::A, Port::C], 0, 20_000);
        let odv = Odv::new(&DEFAULT_GRID, &mut hub, Box::new(NoDelay), &OdvParams::default())
            .unwrap();
        (hub, odv)
    }

    #[test]
    fn test_buttons_to_direction() {
        assert_eq!(Direction::from_buttons(&buttons("NONE")), None);
        assert_eq!(Direction::from_buttons(&buttons("CENTER")), None);
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_PLUS")),
            Some(Direction::North)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_MINUS")),
            Some(Direction::South)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("RIGHT_PLUS")),
            Some(Direction::East)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("RIGHT_MINUS")),
            Some(Direction::West)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_PLUS,RIGHT_PLUS")),
            Some(Direction::NorthEast)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_PLUS,RIGHT_MINUS")),
            Some(Direction::NorthWest)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_MINUS,RIGHT_PLUS")),
            Some(Direction::SouthEast)
        );
        assert_eq!(
            Direction::from_buttons(&buttons("LEFT_MINUS,RIGHT_MINUS")),
            Some(Direction::SouthWest)
        );
    }

    #[test]
    fn test_direction_geometry() {
        for d in Direction::ALL.iter() {
            let (dx, dy) = d.delta();
            let (rx, ry) = d.reverse().delta();
            assert_eq!((dx, dy), (-rx, -ry));
            assert_eq!(d.is_diagonal(), d.leading_corners().len() == 1);
        }
        assert_eq!(Direction::North.delta(), (0, -1));
    }

    #[test]
    fn test_footprint_corners() {
        let fp = Footprint::at(FinePosition::new(10, 20));
        assert_eq!(
            fp.corners(),
            [
                FinePosition::new(11, 21),
                FinePosition::new(17, 21),
                FinePosition::new(17, 27),
                FinePosition::new(11, 27),
            ]
        );
        assert_eq!(
            fp.shifted(Direction::NorthWest).origin,
            FinePosition::new(9, 19)
        );
    }

    #[test]
    fn test_first_proc_homes_vehicle() {
        let (_hub, mut odv) = sim_odv();
        assert!(!odv.motion_ctrl().is_homed());

        let result = odv.proc(ButtonSet::empty(), 0.0).unwrap();

        assert_eq!(result, AutoStepResult::Manual);
        assert!(odv.motion_ctrl().is_homed());
        assert_eq!(odv.motion_ctrl().tile_position(), odv.grid().home());
    }

    #[test]
    fn test_manual_drive_east_out_of_home() {
        let (mut hub, mut odv) = sim_odv();
        odv.proc(ButtonSet::empty(), 0.0).unwrap();
        let start = odv.motion_ctrl().fine_position();

        // Hold RIGHT+ for a while, integrating the motor duty between cycles
        for i in 0..20 {
            odv.proc(buttons("RIGHT_PLUS"), 0.01 * i as f64).unwrap();
            hub.step(0.01);
        }
        odv.proc(ButtonSet::empty(), 0.5).unwrap();

        let end = odv.motion_ctrl().fine_position();
        assert!(end.x > start.x);
        assert_eq!(end.y, start.y);
    }

    #[test]
    fn test_manual_drive_into_wall_is_stopped() {
        let (mut hub, mut odv) = sim_odv();
        odv.proc(ButtonSet::empty(), 0.0).unwrap();
        let home = odv.grid().home();

        // South of home is a wall, the vehicle creeps to the edge of the home tile and stops
        for i in 0..100 {
            odv.proc(buttons("LEFT_MINUS"), 0.01 * i as f64).unwrap();
            hub.step(0.01);
        }

        let end = odv.motion_ctrl().fine_position();
        assert_eq!(odv.motion_ctrl().tile_position(), home);
        assert!(end.y <= home.y * FINE_GRID_SIZE + FINE_GRID_SIZE - ODV_SIZE);
        for corner in odv.motion_ctrl().footprint().corners().iter() {
            assert_eq!(odv.grid().tile_at_fine(*corner), GridTile::Home);
        }
    }

    #[test]
    fn test_missing_motor_error_chain() {
        use std::error::Error;

        let mut hub = SimHub::new(&[Port::A], 0, 20_000);
        let err = match Odv::new(&DEFAULT_GRID, &mut hub, Box::new(NoDelay), &OdvParams::default())
        {
            Err(e) => e,
            Ok(_) => panic!("ODV opened without a Y motor"),
        };

        // The cause is only reported once, by the source
        assert_eq!(err.to_string(), "Could not open the axis motors");
        assert_eq!(
            err.source().unwrap().to_string(),
            DeviceError::NoMotor(Port::C).to_string()
        );
    }

    #[test]
    fn test_end_of_run_unloads_and_returns_home() {
        let (_hub, mut odv) = sim_odv();
        odv.proc(ButtonSet::empty(), 0.0).unwrap();
        odv.ctrl.do_load().unwrap();
        assert!(odv.motion_ctrl().has_load());

        odv.end_of_run(1.0).unwrap();

        assert!(!odv.motion_ctrl().has_load());
        assert_eq!(odv.motion_ctrl().tile_position(), odv.grid().home());
        assert!(!odv.motion_ctrl().is_homed());

        // The next cycle homes again
        odv.proc(ButtonSet::empty(), 2.0).unwrap();
        assert!(odv.motion_ctrl().is_homed());
    }

    #[test]
    fn test_end_of_run_without_load() {
        let (_hub, mut odv) = sim_odv();
        odv.proc(ButtonSet::empty(), 0.0).unwrap();
        odv.ctrl
            .navigate_to_tile(TilePosition::new(3, 1), StopBehavior::Hold)
            .unwrap();

        odv.end_of_run(1.0).unwrap();

        assert_eq!(odv.motion_ctrl().tile_position(), odv.grid().home());
        assert!(!odv.motion_ctrl().has_load());
        assert_eq!(odv.auto_mode(), None);
    }

    #[test]
    fn test_end_of_run_before_homing_only_stops() {
        let (_hub, mut odv) = sim_odv();

        odv.end_of_run(0.0).unwrap();

        assert!(!odv.motion_ctrl().is_homed());
    }
}
