//! # Diagnostics
//!
//! Fatal errors are shown to someone standing next to the vehicle by flashing the hub's status
//! light. The number of red flashes identifies the error:
//!
//! | Flashes | Error                        |
//! |---------|------------------------------|
//! | 1       | Any other error              |
//! | 2       | No motor on port A           |
//! | 3       | No motor on another port     |
//! | 4       | Could not connect the remote |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::Report;
use hub_if::{
    eqpt::{Color, DeviceError, Port, StatusLight},
    time::Delay,
};
use log::error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time the light is on, then off, for each flash.
///
/// Units: milliseconds
const FLASH_PERIOD_MS: u64 = 350;

/// Pause between repeats of a multi-flash code.
///
/// Units: milliseconds
const CODE_GAP_MS: u64 = 2000;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFlashCode {
    Generic = 1,
    NoMotorOnA = 2,
    NoMotorOnB = 3,
    NoRemote = 4,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ErrorFlashCode {
    /// Number of flashes for this code.
    pub fn count(&self) -> u32 {
        *self as u32
    }

    pub fn from_device_error(e: &DeviceError) -> Self {
        match e {
            DeviceError::NoMotor(Port::A) => ErrorFlashCode::NoMotorOnA,
            DeviceError::NoMotor(_) => ErrorFlashCode::NoMotorOnB,
            DeviceError::NoRemote => ErrorFlashCode::NoRemote,
            _ => ErrorFlashCode::Generic,
        }
    }

    /// Find the first equipment error in the report's chain of causes.
    pub fn from_report(report: &Report) -> Self {
        report
            .chain()
            .find_map(|e| e.downcast_ref::<DeviceError>())
            .map(Self::from_device_error)
            .unwrap_or(ErrorFlashCode::Generic)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Flash the code once on the light.
pub fn flash(code: ErrorFlashCode, light: &mut dyn StatusLight, delay: &mut dyn Delay) {
    for _ in 0..code.count() {
        light.on(Color::Red);
        delay.wait_ms(FLASH_PERIOD_MS);
        light.off();
        delay.wait_ms(FLASH_PERIOD_MS);
    }

    if code.count() > 1 {
        delay.wait_ms(CODE_GAP_MS);
    }
}

/// Flash the code forever.
pub fn halt(code: ErrorFlashCode, light: &mut dyn StatusLight, delay: &mut dyn Delay) -> ! {
    error!("Halted, flashing error code {} ({:?})", code.count(), code);

    loop {
        flash(code, light, delay);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        loco_ctrl::{LocoCtrlError, Params, Vehicle, VehicleKind},
        sim::SimHub,
    };
    use color_eyre::eyre::{eyre, WrapErr};
    use hub_if::time::NoDelay;

    /// Records every light change and the total time waited.
    #[derive(Default)]
    struct Recorder {
        colors: Vec<Color>,
        waited_ms: u64,
    }

    impl StatusLight for Recorder {
        fn on(&mut self, color: Color) {
            self.colors.push(color)
        }
    }

    impl Delay for Recorder {
        fn wait_ms(&mut self, ms: u64) {
            self.waited_ms += ms
        }
    }

    #[test]
    fn test_codes_from_reports() {
        let r = Report::new(DeviceError::NoMotor(Port::A));
        assert_eq!(ErrorFlashCode::from_report(&r), ErrorFlashCode::NoMotorOnA);

        let r: Report = Err::<(), _>(DeviceError::NoRemote)
            .wrap_err("Failed to connect")
            .unwrap_err();
        assert_eq!(ErrorFlashCode::from_report(&r), ErrorFlashCode::NoRemote);

        assert_eq!(
            ErrorFlashCode::from_report(&eyre!("Something else")),
            ErrorFlashCode::Generic
        );
    }

    #[test]
    fn test_code_through_vehicle_init() {
        let mut hub = SimHub::new(&[Port::A], 0, 20_000);
        let res: Result<Vehicle, LocoCtrlError> = Vehicle::init(
            VehicleKind::Odv,
            &Params::default(),
            &mut hub,
            Box::new(NoDelay),
        );

        let report = res
            .wrap_err("Failed to initialise the vehicle")
            .err()
            .unwrap();
        assert_eq!(
            ErrorFlashCode::from_report(&report),
            ErrorFlashCode::NoMotorOnB
        );
    }

    #[test]
    fn test_flash() {
        let mut light = Recorder::default();
        let mut delay = Recorder::default();

        flash(ErrorFlashCode::Generic, &mut light, &mut delay);
        assert_eq!(light.colors, vec![Color::Red, Color::None]);
        assert_eq!(delay.waited_ms, 700);

        let mut light = Recorder::default();
        let mut delay = Recorder::default();

        flash(ErrorFlashCode::NoMotorOnB, &mut light, &mut delay);
        assert_eq!(light.colors.len(), 6);
        assert_eq!(delay.waited_ms, 3 * 700 + 2000);
    }
}
