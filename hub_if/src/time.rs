//! # Blocking waits
//!
//! Choreographed sequences (homing, load/unload) pause between steps. The pause goes through the
//! [`Delay`] trait so tests can run those sequences instantly.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{thread, time::Duration};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something that can block the caller for a number of milliseconds.
pub trait Delay {
    fn wait_ms(&mut self, ms: u64);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Delay for ThreadDelay {
    fn wait_ms(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms))
    }
}

impl Delay for NoDelay {
    fn wait_ms(&mut self, _ms: u64) {}
}
