//! Scripted remote

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hub_if::eqpt::{ButtonSet, RemoteInput};
use log::{debug, info};
use util::script_interpreter::{Pending, ScriptInterpreter};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A remote which replays a timed button script.
///
/// Each line of the script gives the buttons held from that time onwards:
///
/// ```text
/// 0.0: NONE;
/// 1.0: RIGHT_PLUS;
/// 2.5: LEFT_PLUS, RIGHT_PLUS;
/// 4.0: NONE;
/// ```
pub struct ScriptedRemote {
    interpreter: ScriptInterpreter<ButtonSet>,
    clock: Box<dyn FnMut() -> f64>,
    current: ButtonSet,
    finished: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptedRemote {
    /// Replay the script against the session clock.
    pub fn new(interpreter: ScriptInterpreter<ButtonSet>) -> Self {
        Self::with_clock(interpreter, util::session::get_elapsed_seconds)
    }

    /// Replay the script against a custom clock, returning seconds.
    pub fn with_clock<F>(interpreter: ScriptInterpreter<ButtonSet>, clock: F) -> Self
    where
        F: FnMut() -> f64 + 'static,
    {
        Self {
            interpreter,
            clock: Box::new(clock),
            current: ButtonSet::empty(),
            finished: false,
        }
    }

    /// True once every line of the script has been replayed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RemoteInput for ScriptedRemote {
    fn pressed(&mut self) -> ButtonSet {
        let now_s = (self.clock)();

        match self.interpreter.get_pending(now_s) {
            Pending::None => (),
            Pending::Some(sets) => {
                if let Some(last) = sets.last() {
                    debug!("Script buttons at {:.2} s: {:?}", now_s, last);
                    self.current = *last;
                }
            }
            Pending::EndOfScript => {
                if !self.finished {
                    info!("End of remote script reached");
                    self.finished = true;
                }
            }
        }

        self.current
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
