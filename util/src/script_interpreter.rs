//! # Timed script interpreter
//!
//! Scripts are lists of `<time_s>: <payload>;` entries, one per line. The interpreter parses each
//! payload into a command of type `C` and hands them out once their execution time has passed.
//!
//! ```text
//! 0.5: LEFT_PLUS;
//! 1.25: LEFT_PLUS, RIGHT_PLUS;
//! 3.0: NONE;
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug, Clone)]
struct Command<C> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    cmd: C,
}

/// A script interpreter.
///
/// After initialising with the script use `.get_pending` to acquire the commands that need
/// executing.
#[derive(Debug, Clone)]
pub struct ScriptInterpreter<C> {
    cmds: VecDeque<Command<C>>,
    duration_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCommand(f64, String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    OutOfOrder(f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pending<C> {
    None,
    Some(Vec<C>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C> ScriptInterpreter<C>
where
    C: FromStr,
    C::Err: Display,
{
    /// Create a new interpreter from the script at the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let script = fs::read_to_string(script_path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_script(&script)
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        let mut queue: VecDeque<Command<C>> = VecDeque::new();

        // The pattern is a literal so building it cannot fail
        let re = match RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(e) => return Err(ScriptError::InvalidTimestamp(e.to_string())),
        };

        let mut last_time_s = 0.0;

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|_| ScriptError::InvalidTimestamp(time_str.to_string()))?;

            if exec_time_s < last_time_s {
                return Err(ScriptError::OutOfOrder(last_time_s, exec_time_s));
            }
            last_time_s = exec_time_s;

            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let cmd = payload
                .trim()
                .parse::<C>()
                .map_err(|e| ScriptError::InvalidCommand(exec_time_s, e.to_string()))?;

            queue.push_back(Command { exec_time_s, cmd });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            cmds: queue,
            duration_s: last_time_s,
        })
    }
}

impl<C> ScriptInterpreter<C> {
    /// Return the commands whose execution time is at or before `current_time_s`.
    pub fn get_pending(&mut self, current_time_s: f64) -> Pending<C> {
        if self.cmds.is_empty() {
            return Pending::EndOfScript;
        }

        let mut due = vec![];

        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > current_time_s {
                break;
            }
            if let Some(c) = self.cmds.pop_front() {
                due.push(c.cmd);
            }
        }

        if due.is_empty() {
            Pending::None
        } else {
            Pending::Some(due)
        }
    }

    /// Get the number of commands still to be executed
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.duration_s
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
