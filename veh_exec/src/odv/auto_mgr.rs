//! # Autonomous drive manager
//!
//! When the remote has been left alone for long enough the vehicle runs an autonomous cycle on
//! its own:
//!
//! - `SeekLoad` - drive to the load tile and pick up a load,
//! - `TransportToUnload` - drive to the unload tile and drop the load,
//! - `ReturnHome` - drive back to the home tile.
//!
//! Each leg is planned by the [`PathFinder`] and driven one hop per control cycle. The remote is
//! checked before every hop and any press hands control straight back to manual driving.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{mem, path::PathBuf};

use hub_if::eqpt::{ButtonSet, StopBehavior};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{MotionController, MotionError, OdvParams, Path, PathFinder, TilePosition};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Session-relative directory the path finder reports are saved to.
const PATH_REPORT_DIR: &str = "odv";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct AutoMgr {
    timeout_s: f64,
    return_home: bool,
    rehome_every_cycle: bool,
    save_path_reports: bool,

    /// Number of legs planned so far, numbers the saved path reports
    num_legs_planned: u32,

    /// Time of the last remote press, or of the last hand back to manual
    last_press_s: f64,

    state: AutoState,
}

/// A leg being driven.
#[derive(Debug)]
struct Leg {
    mode: AutoMode,
    path: Path,
    next_hop: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The legs of an autonomous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoMode {
    SeekLoad,
    TransportToUnload,
    ReturnHome,
}

/// What happened during one call to [`AutoMgr::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoStepResult {
    /// Not driving autonomously, the remote input should be used to drive the vehicle
    Manual,

    /// A path to the given goal was planned for a new leg
    LegStarted(AutoMode, TilePosition),

    /// The vehicle moved onto the given tile
    Hop(TilePosition),

    /// The leg reached its goal and the goal's action was performed
    LegComplete(AutoMode),

    /// A remote press stopped the vehicle and returned it to manual
    Interrupted,

    /// No path to the leg's goal exists, returned to manual
    RoutingFailure,
}

#[derive(Debug)]
enum AutoState {
    Manual,

    /// A leg needs planning on the next step
    Planning(AutoMode),

    Driving(Leg),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AutoMgr {
    pub fn new(params: &OdvParams) -> Self {
        Self {
            timeout_s: params.auto_drive_timeout_s,
            return_home: params.return_home,
            rehome_every_cycle: params.rehome_every_cycle,
            save_path_reports: params.save_path_reports,
            num_legs_planned: 0,
            last_press_s: 0.0,
            state: AutoState::Manual,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout_s > 0.0
    }

    /// The current leg, or `None` in manual.
    pub fn mode(&self) -> Option<AutoMode> {
        match &self.state {
            AutoState::Manual => None,
            AutoState::Planning(mode) => Some(*mode),
            AutoState::Driving(leg) => Some(leg.mode),
        }
    }

    /// Step the manager by one control cycle.
    pub fn step(
        &mut self,
        ctrl: &mut MotionController,
        finder: &PathFinder,
        pressed: ButtonSet,
        now_s: f64,
    ) -> Result<AutoStepResult, MotionError> {
        // Any press preempts the autonomous cycle
        if !pressed.is_empty() {
            self.last_press_s = now_s;

            if let Some(mode) = self.mode() {
                info!("Remote pressed during {:?}, returning to manual", mode);
                self.state = AutoState::Manual;
                ctrl.stop_all()?;
                return Ok(AutoStepResult::Interrupted);
            }

            return Ok(AutoStepResult::Manual);
        }

        match mem::replace(&mut self.state, AutoState::Manual) {
            AutoState::Manual => {
                if !self.timeout_elapsed(now_s) || !ctrl.is_homed() {
                    return Ok(AutoStepResult::Manual);
                }

                let mode = if ctrl.has_load() {
                    AutoMode::TransportToUnload
                } else {
                    AutoMode::SeekLoad
                };

                info!(
                    "No remote input for {:.1} s, starting autonomous cycle",
                    now_s - self.last_press_s
                );

                self.plan_leg(ctrl, finder, mode, now_s)
            }
            AutoState::Planning(mode) => self.plan_leg(ctrl, finder, mode, now_s),
            AutoState::Driving(leg) => self.drive_leg(ctrl, leg, now_s),
        }
    }

    /// Drop any leg in progress and restart the idle timer.
    pub fn abandon(&mut self, now_s: f64) {
        if let Some(mode) = self.mode() {
            info!("{:?} abandoned", mode);
        }
        self.state = AutoState::Manual;
        self.last_press_s = now_s;
    }

    fn timeout_elapsed(&self, now_s: f64) -> bool {
        self.is_enabled() && now_s - self.last_press_s >= self.timeout_s
    }

    fn plan_leg(
        &mut self,
        ctrl: &mut MotionController,
        finder: &PathFinder,
        mode: AutoMode,
        now_s: f64,
    ) -> Result<AutoStepResult, MotionError> {
        let grid = finder.grid();
        let goal = match mode {
            AutoMode::SeekLoad => grid.load_tile(),
            AutoMode::TransportToUnload => grid.unload(),
            AutoMode::ReturnHome => grid.home(),
        };
        let start = ctrl.tile_position();

        let (result, report) = finder.shortest_path_with_report(start, goal);

        self.num_legs_planned += 1;
        if self.save_path_reports {
            util::session::save(report_path(self.num_legs_planned, mode), report);
        }

        match result {
            Ok(path) => {
                info!(
                    "{:?} leg planned from {} to {}, {} hops",
                    mode,
                    start,
                    goal,
                    path.len()
                );
                self.state = AutoState::Driving(Leg {
                    mode,
                    path,
                    next_hop: 0,
                });
                Ok(AutoStepResult::LegStarted(mode, goal))
            }
            Err(e) => {
                warn!("Routing failure during {:?}: {}, returning to manual", mode, e);
                self.state = AutoState::Manual;
                self.last_press_s = now_s;
                ctrl.stop_all()?;
                Ok(AutoStepResult::RoutingFailure)
            }
        }
    }

    fn drive_leg(
        &mut self,
        ctrl: &mut MotionController,
        mut leg: Leg,
        now_s: f64,
    ) -> Result<AutoStepResult, MotionError> {
        let hop = match leg.path.get(leg.next_hop) {
            Some(h) => *h,
            None => return self.complete_leg(ctrl, leg.mode, now_s),
        };

        // Keep running through tiles in a straight line
        let stop = if leg.path.continues_straight(leg.next_hop) {
            StopBehavior::None
        } else {
            StopBehavior::Hold
        };

        debug!(
            "{:?} hop {}/{}: {:?} to {}",
            leg.mode,
            leg.next_hop + 1,
            leg.path.len(),
            hop.direction,
            hop.tile
        );

        ctrl.navigate_to_tile(hop.tile, stop)?;

        leg.next_hop += 1;
        self.state = AutoState::Driving(leg);

        Ok(AutoStepResult::Hop(hop.tile))
    }

    fn complete_leg(
        &mut self,
        ctrl: &mut MotionController,
        mode: AutoMode,
        now_s: f64,
    ) -> Result<AutoStepResult, MotionError> {
        self.state = match mode {
            AutoMode::SeekLoad => {
                ctrl.do_load()?;
                AutoState::Planning(AutoMode::TransportToUnload)
            }
            AutoMode::TransportToUnload => {
                ctrl.do_unload()?;
                if self.return_home {
                    AutoState::Planning(AutoMode::ReturnHome)
                } else {
                    AutoState::Planning(AutoMode::SeekLoad)
                }
            }
            AutoMode::ReturnHome => {
                ctrl.stop_all()?;
                if self.rehome_every_cycle {
                    info!("Autonomous cycle complete, homing reset");
                    ctrl.reset_homing();
                    self.last_press_s = now_s;
                    AutoState::Manual
                } else {
                    AutoState::Planning(AutoMode::SeekLoad)
                }
            }
        };

        Ok(AutoStepResult::LegComplete(mode))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Session-relative path of the report for the `leg_num`th planned leg.
fn report_path(leg_num: u32, mode: AutoMode) -> PathBuf {
    PathBuf::from(PATH_REPORT_DIR).join(format!("path_finder_{:04}_{:?}.json", leg_num, mode))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{
        odv::{GridMap, DEFAULT_GRID},
        sim::SimHub,
    };
    use hub_if::{
        eqpt::{Hub, Port},
        time::NoDelay,
    };

    struct Rig {
        _hub: SimHub,
        ctrl: MotionController,
        finder: PathFinder,
        mgr: AutoMgr,
    }

    impl Rig {
        fn new(lines: &[&str], params: OdvParams) -> Self {
            let mut hub = SimHub::new(&[Port::A, Port::C], 0, 20_000);
            let grid = Arc::new(GridMap::load(lines).unwrap());

            let mut ctrl = MotionController::new(
                hub.motor(params.x_motor_port, params.x_motor_direction)
                    .unwrap(),
                hub.motor(params.y_motor_port, params.y_motor_direction)
                    .unwrap(),
                Box::new(NoDelay),
                grid.clone(),
                &params,
            );
            ctrl.homing_cycle().unwrap();

            Self {
                _hub: hub,
                ctrl,
                finder: PathFinder::new(grid),
                mgr: AutoMgr::new(&params),
            }
        }

        fn step(&mut self, pressed: ButtonSet, now_s: f64) -> AutoStepResult {
            self.mgr
                .step(&mut self.ctrl, &self.finder, pressed, now_s)
                .unwrap()
        }

        /// Step `n` times without any remote input, starting at `t0`.
        fn run(&mut self, t0: f64, n: usize) -> Vec<AutoStepResult> {
            (0..n)
                .map(|i| self.step(ButtonSet::empty(), t0 + 0.01 * i as f64))
                .collect()
        }
    }

    fn params(timeout_s: f64) -> OdvParams {
        OdvParams {
            auto_drive_timeout_s: timeout_s,
            save_path_reports: false,
            ..OdvParams::default()
        }
    }

    fn press() -> ButtonSet {
        "LEFT_PLUS".parse().unwrap()
    }

    #[test]
    fn test_manual_until_timeout() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));

        assert_eq!(rig.step(ButtonSet::empty(), 1.0), AutoStepResult::Manual);
        assert_eq!(rig.step(press(), 4.0), AutoStepResult::Manual);

        // The press restarted the timer
        assert_eq!(rig.step(ButtonSet::empty(), 8.0), AutoStepResult::Manual);
        assert_eq!(
            rig.step(ButtonSet::empty(), 9.0),
            AutoStepResult::LegStarted(AutoMode::SeekLoad, TilePosition::new(1, 0))
        );
        assert_eq!(rig.mgr.mode(), Some(AutoMode::SeekLoad));
    }

    #[test]
    fn test_zero_timeout_disables_auto() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(0.0));

        assert!(rig
            .run(1000.0, 10)
            .iter()
            .all(|r| *r == AutoStepResult::Manual));
    }

    #[test]
    fn test_not_homed_stays_manual() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(1.0));
        rig.ctrl.reset_homing();

        assert_eq!(rig.step(ButtonSet::empty(), 10.0), AutoStepResult::Manual);
    }

    #[test]
    fn test_full_cycle() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));
        let home = TilePosition::new(0, 1);

        // Start, 2 hops, load, start, 8 hops, unload, start, 10 hops, home
        let results = rig.run(5.0, 26);

        assert_eq!(
            results[0],
            AutoStepResult::LegStarted(AutoMode::SeekLoad, TilePosition::new(1, 0))
        );
        assert_eq!(results[1], AutoStepResult::Hop(TilePosition::new(1, 1)));
        assert_eq!(results[2], AutoStepResult::Hop(TilePosition::new(1, 0)));
        assert_eq!(results[3], AutoStepResult::LegComplete(AutoMode::SeekLoad));
        assert_eq!(
            results[4],
            AutoStepResult::LegStarted(AutoMode::TransportToUnload, TilePosition::new(5, 0))
        );
        assert_eq!(
            results[12],
            AutoStepResult::Hop(TilePosition::new(5, 0))
        );
        assert_eq!(
            results[13],
            AutoStepResult::LegComplete(AutoMode::TransportToUnload)
        );
        assert_eq!(
            results[14],
            AutoStepResult::LegStarted(AutoMode::ReturnHome, home)
        );
        assert_eq!(results[25], AutoStepResult::LegComplete(AutoMode::ReturnHome));

        let completed: Vec<AutoStepResult> = results
            .iter()
            .filter(|r| matches!(r, AutoStepResult::LegComplete(_)))
            .copied()
            .collect();
        assert_eq!(
            completed,
            vec![
                AutoStepResult::LegComplete(AutoMode::SeekLoad),
                AutoStepResult::LegComplete(AutoMode::TransportToUnload),
                AutoStepResult::LegComplete(AutoMode::ReturnHome),
            ]
        );
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, AutoStepResult::Hop(_)))
                .count(),
            20
        );

        // Back home, unloaded, and waiting to be re-homed
        assert_eq!(rig.ctrl.tile_position(), home);
        assert!(!rig.ctrl.has_load());
        assert!(!rig.ctrl.is_homed());
        assert_eq!(rig.mgr.mode(), None);
        assert_eq!(rig.step(ButtonSet::empty(), 100.0), AutoStepResult::Manual);
    }

    #[test]
    fn test_no_return_home_loops_to_seek_load() {
        let mut rig = Rig::new(
            &DEFAULT_GRID,
            OdvParams {
                return_home: false,
                ..params(5.0)
            },
        );

        let results = rig.run(5.0, 15);

        assert_eq!(
            results[13],
            AutoStepResult::LegComplete(AutoMode::TransportToUnload)
        );
        assert_eq!(
            results[14],
            AutoStepResult::LegStarted(AutoMode::SeekLoad, TilePosition::new(1, 0))
        );
        assert!(rig.ctrl.is_homed());
    }

    #[test]
    fn test_already_loaded_goes_to_unload() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));
        rig.ctrl.do_load().unwrap();

        assert_eq!(
            rig.step(ButtonSet::empty(), 5.0),
            AutoStepResult::LegStarted(AutoMode::TransportToUnload, TilePosition::new(5, 0))
        );
    }

    #[test]
    fn test_press_interrupts_leg() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));

        rig.run(5.0, 2);
        assert_eq!(rig.ctrl.tile_position(), TilePosition::new(1, 1));

        assert_eq!(rig.step(press(), 5.1), AutoStepResult::Interrupted);
        assert_eq!(rig.mgr.mode(), None);

        // Vehicle stays where it was stopped and the timer starts over
        assert_eq!(rig.step(ButtonSet::empty(), 6.0), AutoStepResult::Manual);
        assert_eq!(rig.ctrl.tile_position(), TilePosition::new(1, 1));
        assert!(matches!(
            rig.step(ButtonSet::empty(), 10.5),
            AutoStepResult::LegStarted(AutoMode::SeekLoad, _)
        ));
    }

    #[test]
    fn test_routing_failure_returns_to_manual() {
        // The load tile is walled off from home
        let mut rig = Rig::new(&["H#X", "##X", "XXX", "L#U"], params(5.0));

        assert_eq!(
            rig.step(ButtonSet::empty(), 5.0),
            AutoStepResult::RoutingFailure
        );
        assert_eq!(rig.mgr.mode(), None);

        // Retried only after another full timeout
        assert_eq!(rig.step(ButtonSet::empty(), 9.0), AutoStepResult::Manual);
        assert_eq!(
            rig.step(ButtonSet::empty(), 10.0),
            AutoStepResult::RoutingFailure
        );
    }

    #[test]
    fn test_report_paths_are_unique_per_leg() {
        let first = report_path(1, AutoMode::SeekLoad);
        let second = report_path(2, AutoMode::TransportToUnload);

        assert_eq!(first, PathBuf::from("odv/path_finder_0001_SeekLoad.json"));
        assert_ne!(first, second);
        assert_ne!(
            report_path(3, AutoMode::SeekLoad),
            report_path(4, AutoMode::SeekLoad)
        );
    }

    #[test]
    fn test_legs_are_counted() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));

        // Two legs planned within the same second
        rig.run(5.0, 5);
        assert_eq!(rig.mgr.num_legs_planned, 2);
    }

    #[test]
    fn test_abandon_drops_leg_and_restarts_timer() {
        let mut rig = Rig::new(&DEFAULT_GRID, params(5.0));

        rig.run(5.0, 2);
        rig.mgr.abandon(5.1);
        assert_eq!(rig.mgr.mode(), None);

        assert_eq!(rig.step(ButtonSet::empty(), 10.0), AutoStepResult::Manual);
        assert!(matches!(
            rig.step(ButtonSet::empty(), 10.1),
            AutoStepResult::LegStarted(AutoMode::SeekLoad, _)
        ));
    }
}
