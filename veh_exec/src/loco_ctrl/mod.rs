//! Locomotion control module
//!
//! Dispatches the remote input to the kinematics of the vehicle being driven. Only the ODV has
//! navigation state, the other vehicles map buttons straight to motor demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod servo_steer;
mod skid_steer;
mod train;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use hub_if::{
    eqpt::{ButtonSet, DeviceError, Hub, Side},
    time::Delay,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::odv::{AutoStepResult, Odv, OdvError, OdvTm, DEFAULT_GRID};

pub use self::{
    params::{Params, ServoSteerParams, SkidSteerParams, TrainParams},
    servo_steer::ServoSteer,
    skid_steer::SkidSteer,
    train::Train,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// What a vehicle kind can do beyond driving from the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Controls swap sides when the hub is turned over
    pub supports_flip: bool,

    /// Calibrates its position against end stops
    pub supports_homing: bool,

    /// Can drive itself when the remote is idle
    pub supports_auto_drive: bool,
}

/// Input data to LocoCtrl for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Buttons held this cycle
    pub pressed: ButtonSet,

    /// Buttons held this cycle but not the last one
    pub newly_pressed: ButtonSet,

    /// Session time.
    ///
    /// Units: seconds
    pub now_s: f64,
}

/// Status report for LocoCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusReport {
    /// Result of the ODV's autonomous drive step, `None` for other vehicles
    pub auto_step: Option<AutoStepResult>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The vehicle kinds which can be selected in the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleKind {
    SkidSteer,
    ServoSteer,
    Train,
    Odv,
}

/// The vehicle being driven.
pub enum Vehicle {
    SkidSteer(SkidSteer),
    ServoSteer(ServoSteer),
    Train(Train),
    Odv(Box<Odv>),
}

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Equipment error")]
    Device(#[from] DeviceError),

    #[error("ODV error")]
    Odv(#[from] OdvError),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl VehicleKind {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            VehicleKind::SkidSteer => Capabilities {
                supports_flip: true,
                ..Capabilities::default()
            },
            VehicleKind::ServoSteer | VehicleKind::Train => Capabilities::default(),
            VehicleKind::Odv => Capabilities {
                supports_flip: false,
                supports_homing: true,
                supports_auto_drive: true,
            },
        }
    }
}

impl Vehicle {
    /// Open the vehicle's motors on the hub and run any start-up calibration.
    ///
    /// The delay is used by the ODV's blocking sequences.
    pub fn init(
        kind: VehicleKind,
        params: &Params,
        hub: &mut dyn Hub,
        delay: Box<dyn Delay>,
    ) -> Result<Self, LocoCtrlError> {
        let vehicle = match kind {
            VehicleKind::SkidSteer => Vehicle::SkidSteer(SkidSteer::new(&params.skid_steer, hub)?),
            VehicleKind::ServoSteer => {
                Vehicle::ServoSteer(ServoSteer::new(&params.servo_steer, hub)?)
            }
            VehicleKind::Train => Vehicle::Train(Train::new(&params.train, hub)?),
            VehicleKind::Odv => {
                Vehicle::Odv(Box::new(Odv::new(&DEFAULT_GRID, hub, delay, &params.odv)?))
            }
        };

        info!("{:?} vehicle initialised", kind);

        Ok(vehicle)
    }

    pub fn kind(&self) -> VehicleKind {
        match self {
            Vehicle::SkidSteer(_) => VehicleKind::SkidSteer,
            Vehicle::ServoSteer(_) => VehicleKind::ServoSteer,
            Vehicle::Train(_) => VehicleKind::Train,
            Vehicle::Odv(_) => VehicleKind::Odv,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind().capabilities()
    }

    /// True if the vehicle will drive itself once the remote is idle.
    pub fn auto_drive_enabled(&self) -> bool {
        match self {
            Vehicle::Odv(odv) => odv.auto_drive_enabled(),
            _ => false,
        }
    }

    /// Process one cycle of remote input.
    pub fn proc(&mut self, input: &InputData) -> Result<StatusReport, LocoCtrlError> {
        let mut report = StatusReport::default();

        match self {
            Vehicle::SkidSteer(v) => v.proc(input.pressed)?,
            Vehicle::ServoSteer(v) => v.proc(input.pressed)?,
            Vehicle::Train(v) => v.proc(input.newly_pressed)?,
            Vehicle::Odv(v) => report.auto_step = Some(v.proc(input.pressed, input.now_s)?),
        }

        Ok(report)
    }

    /// Pass the hub orientation to vehicles which support flipping.
    pub fn handle_flip(&mut self, up_side: Side) {
        if let Vehicle::SkidSteer(v) = self {
            v.handle_flip(up_side)
        }
    }

    pub fn stop_all(&mut self) -> Result<(), LocoCtrlError> {
        match self {
            Vehicle::SkidSteer(v) => v.stop_all()?,
            Vehicle::ServoSteer(v) => v.stop_all()?,
            Vehicle::Train(v) => v.stop_all()?,
            Vehicle::Odv(v) => v.stop_all()?,
        }

        Ok(())
    }

    /// Bring the vehicle to rest at the end of a timed run.
    ///
    /// Most vehicles just stop. The ODV also drops any load and drives home.
    pub fn end_of_run(&mut self, now_s: f64) -> Result<(), LocoCtrlError> {
        match self {
            Vehicle::Odv(odv) => odv.end_of_run(now_s)?,
            _ => self.stop_all()?,
        }

        Ok(())
    }

    /// ODV telemetry for this cycle, `None` for other vehicles.
    pub fn odv_tm(&self, time_s: f64) -> Option<OdvTm> {
        match self {
            Vehicle::Odv(odv) => Some(odv.tm(time_s)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimHub;
    use hub_if::{eqpt::Port, time::NoDelay};

    fn init(kind: VehicleKind, ports: &[Port]) -> Result<Vehicle, LocoCtrlError> {
        let mut hub = SimHub::new(ports, 0, 20_000);
        Vehicle::init(kind, &Params::default(), &mut hub, Box::new(NoDelay))
    }

    #[test]
    fn test_capabilities() {
        assert!(VehicleKind::SkidSteer.capabilities().supports_flip);
        assert!(!VehicleKind::SkidSteer.capabilities().supports_homing);
        assert_eq!(VehicleKind::Train.capabilities(), Capabilities::default());
        assert_eq!(
            VehicleKind::ServoSteer.capabilities(),
            Capabilities::default()
        );

        let odv = VehicleKind::Odv.capabilities();
        assert!(odv.supports_homing && odv.supports_auto_drive && !odv.supports_flip);
    }

    #[test]
    fn test_init_each_kind() {
        let all = [Port::A, Port::B, Port::C];

        for kind in [
            VehicleKind::SkidSteer,
            VehicleKind::ServoSteer,
            VehicleKind::Train,
            VehicleKind::Odv,
        ]
        .iter()
        {
            let vehicle = init(*kind, &all).unwrap();
            assert_eq!(vehicle.kind(), *kind);
            assert_eq!(vehicle.odv_tm(0.0).is_some(), *kind == VehicleKind::Odv);
            assert!(!vehicle.auto_drive_enabled());
        }
    }

    #[test]
    fn test_missing_motor_is_reported_by_port() {
        // ODV axes are on ports A and C
        match init(VehicleKind::Odv, &[Port::A, Port::B]) {
            Err(LocoCtrlError::Odv(OdvError::Device(DeviceError::NoMotor(p)))) => {
                assert_eq!(p, Port::C)
            }
            _ => panic!("expected a missing motor on port C"),
        }

        match init(VehicleKind::SkidSteer, &[Port::B]) {
            Err(LocoCtrlError::Device(DeviceError::NoMotor(p))) => assert_eq!(p, Port::A),
            _ => panic!("expected a missing motor on port A"),
        }
    }

    #[test]
    fn test_proc_reports_auto_step_for_odv() {
        let mut hub = SimHub::new(&[Port::A, Port::C], 0, 20_000);
        let mut vehicle =
            Vehicle::init(VehicleKind::Odv, &Params::default(), &mut hub, Box::new(NoDelay))
                .unwrap();

        let report = vehicle.proc(&InputData::default()).unwrap();
        assert_eq!(report.auto_step, Some(AutoStepResult::Manual));
        vehicle.stop_all().unwrap();

        let mut hub = SimHub::new(&[Port::A], 0, 20_000);
        let mut vehicle =
            Vehicle::init(VehicleKind::Train, &Params::default(), &mut hub, Box::new(NoDelay))
                .unwrap();
        assert_eq!(
            vehicle.proc(&InputData::default()).unwrap(),
            StatusReport::default()
        );
    }

    #[test]
    fn test_end_of_run() {
        let mut hub = SimHub::new(&[Port::A, Port::C], 0, 20_000);
        let mut vehicle =
            Vehicle::init(VehicleKind::Odv, &Params::default(), &mut hub, Box::new(NoDelay))
                .unwrap();
        vehicle.proc(&InputData::default()).unwrap();

        vehicle.end_of_run(1.0).unwrap();
        match vehicle {
            Vehicle::Odv(ref odv) => {
                assert!(!odv.motion_ctrl().is_homed());
                assert_eq!(odv.motion_ctrl().tile_position(), odv.grid().home());
            }
            _ => unreachable!(),
        }

        let mut vehicle = init(VehicleKind::SkidSteer, &[Port::A, Port::B]).unwrap();
        vehicle.end_of_run(1.0).unwrap();
    }
}
