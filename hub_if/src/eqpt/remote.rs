//! # Remote Equipment Interface
//!
//! Buttons of the handheld remote and the set of buttons pressed at one instant.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, iter::FromIterator, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Every button on the remote, in bit order.
pub const ALL_BUTTONS: [Button; 7] = [
    Button::Left,
    Button::LeftPlus,
    Button::LeftMinus,
    Button::Center,
    Button::Right,
    Button::RightPlus,
    Button::RightMinus,
];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of remote button presses, polled once per cycle.
pub trait RemoteInput {
    /// The buttons pressed right now.
    fn pressed(&mut self) -> ButtonSet;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A set of remote buttons, stored as a bitmask.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Copy, Clone, Hash)]
pub struct ButtonSet(u8);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Buttons on the remote.
///
/// The left and right pads each have a `+`, a `-` and a centre (red) button, with the green
/// button in the middle.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Button {
    Left,
    LeftPlus,
    LeftMinus,
    Center,
    Right,
    RightPlus,
    RightMinus,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ButtonParseError {
    #[error("Unknown button name \"{0}\"")]
    UnknownButton(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Button {
    fn mask(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl FromStr for Button {
    type Err = ButtonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEFT" => Ok(Button::Left),
            "LEFT_PLUS" | "LEFT+" => Ok(Button::LeftPlus),
            "LEFT_MINUS" | "LEFT-" => Ok(Button::LeftMinus),
            "CENTER" => Ok(Button::Center),
            "RIGHT" => Ok(Button::Right),
            "RIGHT_PLUS" | "RIGHT+" => Ok(Button::RightPlus),
            "RIGHT_MINUS" | "RIGHT-" => Ok(Button::RightMinus),
            other => Err(ButtonParseError::UnknownButton(other.to_string())),
        }
    }
}

impl ButtonSet {
    /// A set with no buttons pressed.
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.mask()
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.mask()
    }

    /// Buttons present in `self` but not in `previous`, i.e. newly pressed ones.
    pub fn newly_pressed(&self, previous: &ButtonSet) -> ButtonSet {
        ButtonSet(self.0 & !previous.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Button> + '_ {
        ALL_BUTTONS.iter().copied().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        let mut set = ButtonSet::empty();
        for b in iter {
            set.insert(b);
        }
        set
    }
}

/// Parses a comma separated list of buttons, for example `LEFT_PLUS, RIGHT_PLUS`. The word
/// `NONE` (or an empty string) is the empty set.
impl FromStr for ButtonSet {
    type Err = ButtonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(ButtonSet::empty());
        }

        s.split(',').map(|b| b.parse::<Button>()).collect()
    }
}

impl fmt::Display for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<String> = self.iter().map(|b| format!("{:?}", b)).collect();
        write!(f, "{}", names.join(","))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
