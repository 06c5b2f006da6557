//! Main lane keeping executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Frame intake: drain the camera socket into the frame buffer
//!         - Skip the rest of the cycle if no frame has arrived yet
//!         - Lane detection
//!         - Lane control processing (smoothing, steering law, clamp, speed governor)
//!         - Motor command publication
//!         - Debug frame publication, if enabled
//!         - Archiving
//!
//! # Modules
//!
//! All cyclic modules (e.g. `lane_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, trace, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::{eqpt::motor::MotorCmd, net::NetParams};
use lks_lib::{
    cycle::{run_cycle, CycleOutcome},
    debug_server::DebugServer,
    frame_buffer::FrameBuffer,
    frame_client::FrameClient,
    lane_ctrl::{self, LaneCtrl},
    lane_det::{LaneDetector, RowScanDetector},
    motor_client::MotorClient,
    params::LksExecParams
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 33.0;

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 1.0 / CYCLE_FREQUENCY_HZ;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "lks_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Lane Keeping Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    let params: LksExecParams = util::params::load(
        "lks_exec.toml"
    ).wrap_err("Could not load exec params")?;

    params.validate().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");
    debug!("{:#?}", params);

    // ---- SHUTDOWN HANDLER ----

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .wrap_err("Failed to set the shutdown handler")?;
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut lane_ctrl = LaneCtrl::init(lane_ctrl::InitData {
        params: params.lane_ctrl.clone(),
        cycle_period_s: CYCLE_PERIOD_S
    }).wrap_err("Failed to initialise LaneCtrl")?;
    lane_ctrl.init_archive(&session)
        .wrap_err("Failed to initialise the LaneCtrl archive")?;
    info!(
        "LaneCtrl init complete, using the {:?} steering law",
        params.lane_ctrl.steering.law
    );

    let mut detector = RowScanDetector::new(params.lane_det.clone());
    info!("LaneDet init complete");

    let mut frame_buffer = FrameBuffer::new();

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut frame_client = {
        let c = FrameClient::new(
            &zmq_ctx,
            &net_params.frame_endpoint,
            &params.topic.sub_name,
            params.topic.queue_size
        ).wrap_err("Failed to initialise FrameClient")?;
        info!("FrameClient initialised");
        c
    };

    let mut motor_client = {
        let c = MotorClient::new(
            &zmq_ctx,
            &net_params.motor_endpoint,
            &params.topic.pub_name,
            params.topic.queue_size
        ).wrap_err("Failed to initialise MotorClient")?;
        info!("MotorClient initialised");
        c
    };

    let mut debug_server = match params.debug {
        true => {
            let s = DebugServer::new(&zmq_ctx, &net_params.debug_endpoint)
                .wrap_err("Failed to initialise DebugServer")?;
            info!("DebugServer initialised");
            Some(s)
        },
        false => None
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut num_cycles: u64 = 0;
    let mut camera_connected = false;
    let mut waiting_logged = false;

    while running.load(Ordering::SeqCst) {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- FRAME INTAKE ----

        if frame_client.is_connected() != camera_connected {
            camera_connected = !camera_connected;
            match camera_connected {
                true => info!("Camera connected"),
                false => warn!("Camera disconnected")
            }
        }

        match frame_client.service(&mut frame_buffer) {
            Ok(r) if r.accepted > 1 => trace!("{} frames recieved, only the newest is kept", r.accepted),
            Ok(_) => (),
            Err(e) => warn!("Error recieving camera frames: {}", e)
        }

        // ---- CONTROL ----

        match run_cycle(&mut lane_ctrl, &frame_buffer, &mut detector, &mut motor_client) {
            Ok(CycleOutcome::Skipped) => {
                if !waiting_logged {
                    info!("Waiting for the first camera frame");
                    waiting_logged = true;
                }
            },
            Ok(CycleOutcome::Processed { lane, report, .. }) => {

                // ---- DEBUG ----

                if let (Some(server), Some(frame)) = (debug_server.as_mut(), frame_buffer.latest()) {
                    let row = detector.scan_row().unwrap_or(frame.height() / 2);
                    if let Err(e) = server.send(frame, row, &lane, report.smoothed_midpoint_px) {
                        warn!("Could not publish debug frame: {}", e);
                    }
                }

                // ---- ARCHIVE ----

                if let Err(e) = lane_ctrl.write() {
                    warn!("Could not archive LaneCtrl status: {}", e);
                }
            },
            Err(e) => warn!("Error during the control cycle: {}", e)
        }

        // ---- CYCLE MANAGEMENT ----

        // Get the end time of the cycle
        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            )
        }

        // Increment cycle counter
        num_cycles = num_cycles.wrapping_add(1);
    }

    // ---- SHUTDOWN ----

    info!("Shutdown requested after {} cycles", num_cycles);

    // Leave the vehicle stopped with the wheels straight
    if let Err(e) = motor_client.send(&MotorCmd::default()) {
        warn!("Could not send the stop command: {}", e);
    }

    info!("End of execution");

    Ok(())
}
