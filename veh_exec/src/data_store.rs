//! # Data Store

use hub_if::eqpt::ButtonSet;
use log::debug;

use crate::{
    countdown::{Countdown, CountdownState},
    loco_ctrl::{InputData, StatusReport},
    odv::OdvTm,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub sim_time_s: f64,

    // Remote
    /// Buttons held this cycle
    pub pressed: ButtonSet,

    /// Buttons held last cycle
    pub prev_pressed: ButtonSet,

    // Countdown
    /// `None` when the countdown is not in use
    pub countdown_state: Option<CountdownState>,

    /// Units: seconds
    pub countdown_remaining_s: f64,

    // LocoCtrl
    pub loco_ctrl_input: InputData,
    pub loco_ctrl_status_rpt: StatusReport,

    // ODV
    pub odv_tm: Option<OdvTm>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.loco_ctrl_input = InputData::default();
        self.loco_ctrl_status_rpt = StatusReport::default();
        self.odv_tm = None;

        self.sim_time_s = util::session::get_elapsed_seconds();
    }

    /// Record this cycle's buttons and build the LocoCtrl input from them.
    pub fn set_buttons(&mut self, pressed: ButtonSet) {
        self.pressed = pressed;

        let newly_pressed = pressed.newly_pressed(&self.prev_pressed);
        if !newly_pressed.is_empty() {
            debug!("Newly pressed: {}", newly_pressed);
        }

        self.loco_ctrl_input = InputData {
            pressed,
            newly_pressed,
            now_s: self.sim_time_s,
        };
    }

    /// Buttons held this cycle but not the last one.
    pub fn newly_pressed(&self) -> ButtonSet {
        self.loco_ctrl_input.newly_pressed
    }

    /// Step the countdown with this cycle's buttons, returning its new state if it changed.
    pub fn update_countdown(&mut self, countdown: &mut Countdown) -> Option<CountdownState> {
        let change = countdown.proc(self.pressed, self.newly_pressed(), self.sim_time_s);

        self.countdown_state = Some(countdown.state());
        self.countdown_remaining_s = countdown.remaining_s(self.sim_time_s);

        change
    }

    /// True if the vehicle may be processed this cycle, always the case without a countdown.
    pub fn vehicle_enabled(&self) -> bool {
        self.countdown_state.map_or(true, |s| s.is_running())
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.prev_pressed = self.pressed;
        self.num_cycles += 1;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
