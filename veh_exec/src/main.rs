//! Main vehicle executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the hub, the remote and the vehicle
//!     - Main loop:
//!         - Remote input acquisition
//!         - Countdown processing, ending the run when time is up
//!         - Flip handling
//!         - Locomotion control processing (including the ODV's autonomy)
//!         - Telemetry archiving
//!     - On a fatal error, flash the error code on the hub status light forever
//!
//! # Usage
//!
//! ```text
//! veh_exec [remote_script]
//! ```
//!
//! With no argument the remote must be disabled in `veh_exec.toml`, in which case only a vehicle
//! which can drive itself will run. With one argument the remote's button presses are replayed
//! from the given script, and the vehicle only drives while the countdown started by CENTER is
//! running.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::{
    env, thread,
    time::{Duration, Instant},
};

// Internal
use hub_if::{
    eqpt::{ButtonSet, DeviceError, Hub, RemoteInput},
    time::ThreadDelay,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    script_interpreter::ScriptInterpreter,
    session::Session,
};
use veh_lib::{
    countdown::{Countdown, CountdownState},
    data_store::DataStore,
    diag::{self, ErrorFlashCode},
    loco_ctrl::{self, Vehicle, VehicleKind},
    params::VehExecParams,
    sim::{ScriptedRemote, SimHub},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Session relative path of the ODV telemetry archive.
const ODV_TM_ARCHIVE_PATH: &str = "odv/tm.csv";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("veh_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: VehExecParams =
        util::params::load("veh_exec.toml").wrap_err("Could not load exec params")?;

    let loco_ctrl_params: loco_ctrl::Params =
        util::params::load("loco_ctrl.toml").wrap_err("Could not load LocoCtrl params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE HUB ----

    let mut hub = SimHub::from_params(&exec_params.sim);
    info!(
        "Simulated hub initialised with motors on {:?}",
        exec_params.sim.connected_ports
    );

    // ---- RUN ----

    match run(&exec_params, &loco_ctrl_params, &mut hub, &session) {
        Ok(()) => {
            info!("End of execution");
            session.exit();
            Ok(())
        }
        Err(e) => {
            error!("Fatal error: {:?}", e);
            session.exit();

            let code = ErrorFlashCode::from_report(&e);
            diag::halt(code, hub.light(), &mut ThreadDelay)
        }
    }
}

/// Initialise the remote and the vehicle, then run the main loop until the remote script ends.
fn run(
    params: &VehExecParams,
    loco_ctrl_params: &loco_ctrl::Params,
    hub: &mut SimHub,
    session: &Session,
) -> Result<(), Report> {
    // ---- INITIALISE REMOTE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut remote = match args.len() {
        // If we have a single argument use it as the script path
        2 => {
            info!("Loading remote script from \"{}\"", &args[1]);

            let si: ScriptInterpreter<ButtonSet> =
                ScriptInterpreter::new(&args[1]).wrap_err("Failed to load remote script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} button changes\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(ScriptedRemote::new(si))
        }
        1 if params.remote_disabled => {
            info!("Remote disabled");
            None
        }
        1 => {
            return Err(DeviceError::NoRemote)
                .wrap_err("No remote script given and the remote is not disabled")
        }
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    // ---- INITIALISE VEHICLE ----

    info!("Initialising {:?} vehicle...", params.vehicle);

    let mut vehicle = Vehicle::init(
        params.vehicle,
        loco_ctrl_params,
        hub,
        Box::new(ThreadDelay),
    )
    .wrap_err("Failed to initialise the vehicle")?;

    info!("Capabilities: {:?}", vehicle.capabilities());

    if remote.is_none() && !vehicle.auto_drive_enabled() {
        info!("No remote or auto drive, exiting");
        return Ok(());
    }

    let mut odv_arch = match vehicle {
        Vehicle::Odv(ref odv) => {
            info!("Grid:\n{}\n", odv.grid().display(None));

            Some(
                Archiver::from_path(session, ODV_TM_ARCHIVE_PATH)
                    .wrap_err("Failed to create the ODV telemetry archive")?,
            )
        }
        _ => None,
    };

    // ---- INITIALISE COUNTDOWN ----

    let mut countdown = match remote {
        Some(_) if params.countdown.is_enabled() => {
            info!(
                "Countdown of {:.1} min, press CENTER to start",
                params.countdown.limit_minutes
            );
            Some(Countdown::new(&params.countdown))
        }
        _ => {
            info!("Countdown disabled");
            None
        }
    };

    // ---- INITIALISE DATASTORE ----

    let mut ds = DataStore::default();

    let cycle_period = Duration::from_secs_f64(params.cycle_period_s);
    let cycle_frequency_hz = 1.0 / params.cycle_period_s;

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut last_cycle_instant = Instant::now();

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // Move the simulated motors on by the time since the last cycle
        hub.step((cycle_start_instant - last_cycle_instant).as_secs_f64());
        last_cycle_instant = cycle_start_instant;

        // ---- DATA INPUT ----

        let pressed = match remote {
            Some(ref mut r) => {
                let p = r.pressed();

                // Exit if end of script reached
                if r.is_finished() {
                    info!("End of remote script reached, stopping");
                    break;
                }

                p
            }
            None => ButtonSet::empty(),
        };
        ds.set_buttons(pressed);

        // ---- COUNTDOWN ----

        if let Some(ref mut cd) = countdown {
            match ds.update_countdown(cd) {
                Some(CountdownState::Ended) => vehicle
                    .end_of_run(ds.sim_time_s)
                    .wrap_err("Failed to end the run")?,
                Some(CountdownState::Ready) => {
                    vehicle.stop_all().wrap_err("Failed to stop the vehicle")?
                }
                _ => (),
            }

            cd.show_status(hub.light(), ds.sim_time_s);

            if ds.is_1_hz_cycle && cd.is_running() {
                debug!("Countdown: {:.0} s remaining", ds.countdown_remaining_s);
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        if ds.vehicle_enabled() {
            if vehicle.capabilities().supports_flip {
                vehicle.handle_flip(hub.up_side());
            }

            match vehicle.proc(&ds.loco_ctrl_input) {
                Ok(r) => ds.loco_ctrl_status_rpt = r,
                Err(e) => {
                    if let Err(stop_err) = vehicle.stop_all() {
                        warn!("Could not stop the vehicle: {}", stop_err);
                    }
                    return Err(e).wrap_err("Error during LocoCtrl processing");
                }
            }
        }

        if let Some(ref step) = ds.loco_ctrl_status_rpt.auto_step {
            if ds.is_1_hz_cycle {
                debug!("Auto step: {:?}", step);
            }
        }

        // ---- WRITE ARCHIVES ----

        ds.odv_tm = vehicle.odv_tm(ds.sim_time_s);

        if let (Some(arch), Some(tm)) = (odv_arch.as_mut(), ds.odv_tm.as_ref()) {
            if let Err(e) = arch.serialise(tm) {
                warn!("Could not archive ODV telemetry: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    vehicle.stop_all().wrap_err("Failed to stop the vehicle")?;

    if vehicle.kind() == VehicleKind::Odv {
        info!("ODV telemetry archived to {:?}", ODV_TM_ARCHIVE_PATH);
    }

    info!("Ran {} cycles", ds.num_cycles);

    Ok(())
}
