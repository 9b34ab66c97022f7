//! # Countdown
//!
//! Bounds each run of the vehicle to a fixed window. CENTER on the remote starts the countdown
//! from ready, and the reset code takes it back to ready at any time. The vehicle may only be
//! driven while the countdown is running. The hub status light shows the state, flashing faster
//! as the end of the run approaches.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{convert::TryFrom, str::FromStr};

use hub_if::eqpt::{Button, ButtonSet, Color, StatusLight};
use log::info;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Remaining time below which the final minute warning is shown.
///
/// Units: seconds
pub const FINAL_MINUTE_S: f64 = 60.0;

/// Remaining time below which the final warning is shown.
///
/// Units: seconds
pub const FINAL_20_SECS_S: f64 = 20.0;

/// In the final minute the remaining time is logged on multiples of this.
///
/// Units: seconds
const ANNOUNCE_PERIOD_S: u64 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CountdownParams {
    /// Length of one run. Zero disables the countdown.
    ///
    /// Units: minutes
    #[serde(default = "default_limit_minutes")]
    pub limit_minutes: f64,

    /// Button code which resets the countdown, see [`ResetCode`].
    #[serde(default)]
    pub reset_code: ResetCode,
}

/// Buttons which must be held together, and no others, to reset the countdown.
///
/// Written as three comma separated pads, left, middle and right. `+` and `-` select the plus
/// and minus buttons of the side pads, `c` the centre buttons. The default `c,c,c` is the left
/// centre, CENTER and right centre buttons together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ResetCode(ButtonSet);

pub struct Countdown {
    limit_s: f64,
    reset_code: ResetCode,

    state: CountdownState,

    /// Session time the running countdown ends at
    end_s: f64,

    /// Session time of the last state change, the phase reference for flashing
    state_since_s: f64,

    /// Remaining whole seconds last logged
    last_announced_s: Option<u64>,
}

/// On/off pattern of the status light. The off part of the period comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightPattern {
    pub color: Color,

    /// Units: milliseconds
    pub on_ms: u64,

    /// Zero for a steady light.
    ///
    /// Units: milliseconds
    pub off_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountdownState {
    /// Waiting for CENTER
    Ready,

    /// Running with more than a minute left
    Active,

    FinalMinute,

    Final20Secs,

    /// Time is up, only the reset code is accepted
    Ended,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResetCodeError {
    #[error("Reset code must have three comma separated pads, got \"{0}\"")]
    WrongPadCount(String),

    #[error("Unknown symbol '{0}' in the reset code")]
    UnknownSymbol(char),

    #[error("Reset code contains no buttons")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CountdownParams {
    fn default() -> Self {
        Self {
            limit_minutes: default_limit_minutes(),
            reset_code: ResetCode::default(),
        }
    }
}

impl CountdownParams {
    pub fn is_enabled(&self) -> bool {
        self.limit_minutes > 0.0
    }
}

impl ResetCode {
    /// True if exactly the code's buttons are held.
    pub fn matches(&self, pressed: ButtonSet) -> bool {
        pressed == self.0
    }
}

impl Default for ResetCode {
    fn default() -> Self {
        ResetCode([Button::Left, Button::Center, Button::Right].iter().copied().collect())
    }
}

impl FromStr for ResetCode {
    type Err = ResetCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pads: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
        if pads.len() != 3 {
            return Err(ResetCodeError::WrongPadCount(s.to_string()));
        }

        let mut buttons = ButtonSet::empty();

        for (i, pad) in pads.iter().enumerate() {
            for symbol in pad.chars() {
                let button = match (i, symbol) {
                    (0, '+') => Button::LeftPlus,
                    (0, '-') => Button::LeftMinus,
                    (0, 'c') => Button::Left,
                    (1, 'c') => Button::Center,
                    (2, '+') => Button::RightPlus,
                    (2, '-') => Button::RightMinus,
                    (2, 'c') => Button::Right,
                    (_, other) => return Err(ResetCodeError::UnknownSymbol(other)),
                };
                buttons.insert(button);
            }
        }

        if buttons.is_empty() {
            return Err(ResetCodeError::Empty);
        }

        Ok(ResetCode(buttons))
    }
}

impl TryFrom<String> for ResetCode {
    type Error = ResetCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl CountdownState {
    /// True while the vehicle may be driven.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            CountdownState::Active | CountdownState::FinalMinute | CountdownState::Final20Secs
        )
    }

    pub fn light_pattern(&self) -> LightPattern {
        let (color, on_ms, off_ms) = match self {
            CountdownState::Ready => (Color::Green, 500, 500),
            CountdownState::Active => (Color::Green, 1, 0),
            CountdownState::FinalMinute => (Color::Orange, 500, 250),
            CountdownState::Final20Secs => (Color::Orange, 200, 100),
            CountdownState::Ended => (Color::Orange, 1, 0),
        };

        LightPattern {
            color,
            on_ms,
            off_ms,
        }
    }
}

impl LightPattern {
    /// Colour of the light `elapsed_ms` into the pattern.
    pub fn color_at(&self, elapsed_ms: u64) -> Color {
        if self.off_ms == 0 {
            return self.color;
        }

        if elapsed_ms % (self.on_ms + self.off_ms) < self.off_ms {
            Color::None
        } else {
            self.color
        }
    }
}

impl Countdown {
    pub fn new(params: &CountdownParams) -> Self {
        Self {
            limit_s: params.limit_minutes * 60.0,
            reset_code: params.reset_code,
            state: CountdownState::Ready,
            end_s: 0.0,
            state_since_s: 0.0,
            last_announced_s: None,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Time left in the run, the full limit before it has started.
    ///
    /// Units: seconds
    pub fn remaining_s(&self, now_s: f64) -> f64 {
        match self.state {
            CountdownState::Ready => self.limit_s,
            CountdownState::Ended => 0.0,
            _ => (self.end_s - now_s).max(0.0),
        }
    }

    /// Update the countdown with this cycle's buttons.
    ///
    /// Returns the new state if it changed.
    pub fn proc(
        &mut self,
        pressed: ButtonSet,
        newly_pressed: ButtonSet,
        now_s: f64,
    ) -> Option<CountdownState> {
        let prev = self.state;

        if !newly_pressed.is_empty() && self.reset_code.matches(pressed) {
            info!("Countdown reset, press CENTER to start");
            self.set_state(CountdownState::Ready, now_s);
            return Some(CountdownState::Ready);
        }

        match self.state {
            CountdownState::Ready if newly_pressed.contains(Button::Center) => {
                info!("Countdown started, {:.0} s to go", self.limit_s);
                self.end_s = now_s + self.limit_s;
                self.last_announced_s = None;
                self.set_state(CountdownState::Active, now_s);
            }
            CountdownState::Active | CountdownState::FinalMinute | CountdownState::Final20Secs => {
                let remaining_s = self.end_s - now_s;
                self.announce(remaining_s);

                let state = if remaining_s <= 0.0 {
                    CountdownState::Ended
                } else if remaining_s < FINAL_20_SECS_S {
                    CountdownState::Final20Secs
                } else if remaining_s < FINAL_MINUTE_S {
                    CountdownState::FinalMinute
                } else {
                    CountdownState::Active
                };

                if state != self.state {
                    if state == CountdownState::Ended {
                        info!("Countdown ended");
                    }
                    self.set_state(state, now_s);
                }
            }
            _ => (),
        }

        if self.state != prev {
            Some(self.state)
        } else {
            None
        }
    }

    /// Drive the status light from the current state.
    pub fn show_status(&self, light: &mut dyn StatusLight, now_s: f64) {
        let elapsed_ms = ((now_s - self.state_since_s).max(0.0) * 1000.0) as u64;
        light.on(self.state.light_pattern().color_at(elapsed_ms));
    }

    fn set_state(&mut self, state: CountdownState, now_s: f64) {
        self.state = state;
        self.state_since_s = now_s;
    }

    fn announce(&mut self, remaining_s: f64) {
        if remaining_s <= 0.0 || remaining_s >= FINAL_MINUTE_S {
            return;
        }

        let secs = remaining_s.ceil() as u64;
        if secs % ANNOUNCE_PERIOD_S == 0 && self.last_announced_s != Some(secs) {
            info!("Countdown ending in 0:{:02}", secs);
            self.last_announced_s = Some(secs);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_limit_minutes() -> f64 {
    3.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn buttons(s: &str) -> ButtonSet {
        s.parse().unwrap()
    }

    /// Countdown of one minute and a half.
    fn countdown() -> Countdown {
        Countdown::new(&CountdownParams {
            limit_minutes: 1.5,
            ..CountdownParams::default()
        })
    }

    #[derive(Default)]
    struct Recorder {
        color: Option<Color>,
    }

    impl StatusLight for Recorder {
        fn on(&mut self, color: Color) {
            self.color = Some(color);
        }
    }

    #[test]
    fn test_parse_reset_code() {
        assert_eq!(
            "c,c,c".parse::<ResetCode>().unwrap(),
            ResetCode::default()
        );

        let code: ResetCode = "+-, , c".parse().unwrap();
        assert!(code.matches(buttons("LEFT_PLUS,LEFT_MINUS,RIGHT")));
        assert!(!code.matches(buttons("LEFT_PLUS,LEFT_MINUS")));
        assert!(!code.matches(buttons("LEFT_PLUS,LEFT_MINUS,RIGHT,CENTER")));

        assert_eq!(
            "c,c".parse::<ResetCode>(),
            Err(ResetCodeError::WrongPadCount("c,c".into()))
        );
        assert_eq!(
            "c,+,c".parse::<ResetCode>(),
            Err(ResetCodeError::UnknownSymbol('+'))
        );
        assert_eq!(",,".parse::<ResetCode>(), Err(ResetCodeError::Empty));
    }

    #[test]
    fn test_params() {
        let p: CountdownParams = util::params::parse("reset_code = \"-,c,-\"").unwrap();
        assert!((p.limit_minutes - 3.0).abs() < 1e-12);
        assert!(p.is_enabled());
        assert!(p.reset_code.matches(buttons("LEFT_MINUS,CENTER,RIGHT_MINUS")));

        assert!(util::params::parse::<CountdownParams>("reset_code = \"x,c,c\"").is_err());

        let p: CountdownParams = util::params::parse("limit_minutes = 0.0").unwrap();
        assert!(!p.is_enabled());
    }

    #[test]
    fn test_center_starts_countdown() {
        let mut cd = countdown();
        assert_eq!(cd.state(), CountdownState::Ready);
        assert!(!cd.is_running());

        // Other buttons do nothing while ready
        assert_eq!(cd.proc(buttons("LEFT_PLUS"), buttons("LEFT_PLUS"), 1.0), None);
        assert!((cd.remaining_s(1.0) - 90.0).abs() < 1e-9);

        assert_eq!(
            cd.proc(buttons("CENTER"), buttons("CENTER"), 2.0),
            Some(CountdownState::Active)
        );
        assert!(cd.is_running());
        assert!((cd.remaining_s(12.0) - 80.0).abs() < 1e-9);

        // Holding CENTER does not restart it
        assert_eq!(cd.proc(buttons("CENTER"), ButtonSet::empty(), 3.0), None);
        assert!((cd.remaining_s(3.0) - 89.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_through_to_end() {
        let mut cd = countdown();
        cd.proc(buttons("CENTER"), buttons("CENTER"), 0.0);

        assert_eq!(cd.proc(ButtonSet::empty(), ButtonSet::empty(), 29.0), None);
        assert_eq!(
            cd.proc(ButtonSet::empty(), ButtonSet::empty(), 31.0),
            Some(CountdownState::FinalMinute)
        );
        assert_eq!(
            cd.proc(ButtonSet::empty(), ButtonSet::empty(), 71.0),
            Some(CountdownState::Final20Secs)
        );
        assert!(cd.is_running());
        assert_eq!(
            cd.proc(ButtonSet::empty(), ButtonSet::empty(), 90.0),
            Some(CountdownState::Ended)
        );
        assert!(!cd.is_running());
        assert_eq!(cd.remaining_s(95.0), 0.0);

        // Ended is only left through the reset code, CENTER does not restart
        assert_eq!(cd.proc(ButtonSet::empty(), ButtonSet::empty(), 100.0), None);
        assert_eq!(cd.proc(buttons("CENTER"), buttons("CENTER"), 101.0), None);
        assert_eq!(cd.state(), CountdownState::Ended);
    }

    #[test]
    fn test_reset_code() {
        let mut cd = countdown();
        cd.proc(buttons("CENTER"), buttons("CENTER"), 0.0);

        // Building up the chord resets once all three are held
        assert_eq!(cd.proc(buttons("LEFT"), buttons("LEFT"), 1.0), None);
        assert_eq!(
            cd.proc(buttons("LEFT,CENTER,RIGHT"), buttons("CENTER,RIGHT"), 1.1),
            Some(CountdownState::Ready)
        );

        // Holding the chord does nothing more
        assert_eq!(cd.proc(buttons("LEFT,CENTER,RIGHT"), ButtonSet::empty(), 1.2), None);

        // Extra buttons spoil the chord
        cd.proc(buttons("CENTER"), buttons("CENTER"), 2.0);
        assert_eq!(
            cd.proc(
                buttons("LEFT,CENTER,RIGHT,LEFT_PLUS"),
                buttons("LEFT,RIGHT,LEFT_PLUS"),
                3.0
            ),
            None
        );
        assert!(cd.is_running());

        // Reset after the end, then start again with a full run
        cd.proc(ButtonSet::empty(), ButtonSet::empty(), 200.0);
        assert_eq!(cd.state(), CountdownState::Ended);
        assert_eq!(
            cd.proc(buttons("LEFT,CENTER,RIGHT"), buttons("LEFT,CENTER,RIGHT"), 201.0),
            Some(CountdownState::Ready)
        );
        cd.proc(ButtonSet::empty(), ButtonSet::empty(), 202.0);
        cd.proc(buttons("CENTER"), buttons("CENTER"), 203.0);
        assert!((cd.remaining_s(203.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_status_light() {
        let mut cd = countdown();
        let mut light = Recorder::default();

        // Ready flashes green, off first
        cd.show_status(&mut light, 0.2);
        assert_eq!(light.color, Some(Color::None));
        cd.show_status(&mut light, 0.7);
        assert_eq!(light.color, Some(Color::Green));

        cd.proc(buttons("CENTER"), buttons("CENTER"), 1.0);
        cd.show_status(&mut light, 1.0);
        assert_eq!(light.color, Some(Color::Green));

        cd.proc(ButtonSet::empty(), ButtonSet::empty(), 91.0);
        cd.show_status(&mut light, 92.0);
        assert_eq!(light.color, Some(Color::Orange));
    }

    #[test]
    fn test_light_patterns() {
        let steady = CountdownState::Active.light_pattern();
        assert_eq!(steady.color_at(0), Color::Green);
        assert_eq!(steady.color_at(12_345), Color::Green);

        let fast = CountdownState::Final20Secs.light_pattern();
        assert_eq!(fast.color_at(50), Color::None);
        assert_eq!(fast.color_at(150), Color::Orange);
        assert_eq!(fast.color_at(350), Color::None);

        let slow = CountdownState::FinalMinute.light_pattern();
        assert_eq!(slow.color_at(200), Color::None);
        assert_eq!(slow.color_at(600), Color::Orange);
    }
}
