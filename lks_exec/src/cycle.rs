//! # Control cycle
//!
//! One tick of the lane keeping loop, independent of the transport so it can be driven by tests
//! and benchmarks as well as by the executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::eqpt::motor::MotorCmd;
use util::module::State;

use crate::{
    frame_buffer::FrameBuffer,
    lane_ctrl::{self, LaneCtrl, LaneCtrlError},
    lane_det::{LaneDetector, LanePosition}
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Destination of the motor commands.
///
/// Sending is fire and forget, an error is reported but never retried.
pub trait CmdSink {
    type Error: std::fmt::Display;

    fn send(&mut self, cmd: &MotorCmd) -> Result<(), Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What happened during a cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// No frame has been received yet, nothing was done.
    Skipped,

    /// A frame was processed and a command produced.
    Processed {
        lane: LanePosition,
        cmd: MotorCmd,
        report: lane_ctrl::StatusReport,

        /// False if the sink failed to send the command
        sent: bool
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("LaneCtrl processing failed: {0}")]
    LaneCtrlError(LaneCtrlError)
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run one control cycle on the newest frame in the buffer.
///
/// With an empty buffer the cycle is skipped without touching the controller or the sink.
pub fn run_cycle<D, S>(
    ctrl: &mut LaneCtrl,
    frame_buffer: &FrameBuffer,
    detector: &mut D,
    sink: &mut S
) -> Result<CycleOutcome, CycleError>
where
    D: LaneDetector + ?Sized,
    S: CmdSink + ?Sized
{
    let frame = match frame_buffer.latest() {
        Some(f) => f,
        None => return Ok(CycleOutcome::Skipped)
    };

    let lane = detector.get_lane_position(frame);

    let (cmd, report) = ctrl.proc(&lane_ctrl::InputData {
        lane,
        frame_width: frame.width()
    }).map_err(CycleError::LaneCtrlError)?;

    let sent = match sink.send(&cmd) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not send motor command {:?}: {}", cmd, e);
            false
        }
    };

    Ok(CycleOutcome::Processed { lane, cmd, report, sent })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{frame_buffer::Frame, lane_ctrl::*};
    use comms_if::eqpt::cam::{ImageMsg, PixelEncoding};

    /// Records every command sent.
    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<MotorCmd>,
        fail: bool
    }

    impl CmdSink for RecordingSink {
        type Error = &'static str;

        fn send(&mut self, cmd: &MotorCmd) -> Result<(), Self::Error> {
            if self.fail {
                return Err("transport down")
            }
            self.sent.push(*cmd);
            Ok(())
        }
    }

    /// Returns the same lane edges for every frame.
    struct FixedDetector(LanePosition);

    impl LaneDetector for FixedDetector {
        fn get_lane_position(&mut self, _: &Frame) -> LanePosition {
            self.0
        }
    }

    /// Steering law returning a scripted sequence of angles.
    struct ScriptedLaw(Vec<f64>);

    impl SteeringLaw for ScriptedLaw {
        fn calc_steering_angle(&mut self, _: f64, _: f64, _: f64) -> f64 {
            self.0.remove(0)
        }
    }

    fn params() -> Params {
        util::params::load_str(r#"
[xycar]
start_speed = 10.0
min_speed = 5.0
max_speed = 20.0
speed_control_threshold = 10.0
acceleration_step = 1.0
deceleration_step = 2.0

[stanley]
k_gain = 1.0
look_ahead_distance = 20.0

[pid]
p_gain = 0.0
i_gain = 0.0
d_gain = 0.0

[moving_average_filter]
sample_size = 3
"#).unwrap()
    }

    fn populated_buffer() -> FrameBuffer {
        let mut fb = FrameBuffer::new();
        fb.intake(&ImageMsg {
            width: 640,
            height: 2,
            step: 640 * 3,
            encoding: PixelEncoding::Rgb8,
            data: vec![0; 640 * 3 * 2]
        }).unwrap();
        fb
    }

    #[test]
    fn test_empty_buffer_skips() {
        let mut lc = LaneCtrl::init(InitData { params: params(), cycle_period_s: 0.03 }).unwrap();
        let mut det = FixedDetector(LanePosition { left_x: 100.0, right_x: 500.0 });
        let mut sink = RecordingSink::default();
        let fb = FrameBuffer::new();

        let speed = lc.speed();
        for _ in 0..5 {
            let outcome = run_cycle(&mut lc, &fb, &mut det, &mut sink).unwrap();
            assert!(matches!(outcome, CycleOutcome::Skipped));
        }

        assert_eq!(lc.speed(), speed);
        assert_eq!(lc.num_samples(), 0);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_speed_scenario() {
        let law = ScriptedLaw(vec![5.0, 15.0, 10.0]);
        let mut lc = LaneCtrl::with_steering_law(params(), Box::new(law)).unwrap();
        let mut det = FixedDetector(LanePosition { left_x: 100.0, right_x: 500.0 });
        let mut sink = RecordingSink::default();
        let fb = populated_buffer();

        for _ in 0..3 {
            run_cycle(&mut lc, &fb, &mut det, &mut sink).unwrap();
        }

        let speeds: Vec<i32> = sink.sent.iter().map(|c| c.speed).collect();
        let angles: Vec<i32> = sink.sent.iter().map(|c| c.angle).collect();
        assert_eq!(speeds, vec![11, 9, 10]);
        assert_eq!(angles, vec![5, 15, 10]);
    }

    #[test]
    fn test_smoothing_scenario() {
        let mut lc = LaneCtrl::init(InitData { params: params(), cycle_period_s: 0.03 }).unwrap();
        let mut sink = RecordingSink::default();
        let fb = populated_buffer();

        let mut smoothed = Vec::new();
        for mid in &[100.0, 200.0, 300.0] {
            let mut det = FixedDetector(LanePosition { left_x: *mid - 50.0, right_x: *mid + 50.0 });
            match run_cycle(&mut lc, &fb, &mut det, &mut sink).unwrap() {
                CycleOutcome::Processed { report, .. } => smoothed.push(report.smoothed_midpoint_px),
                CycleOutcome::Skipped => panic!("cycle skipped with a populated buffer")
            }
        }

        assert_eq!(smoothed, vec![100.0, 150.0, 200.0]);
    }

    #[test]
    fn test_send_failure_not_fatal() {
        let mut lc = LaneCtrl::init(InitData { params: params(), cycle_period_s: 0.03 }).unwrap();
        let mut det = FixedDetector(LanePosition { left_x: 100.0, right_x: 500.0 });
        let mut sink = RecordingSink { fail: true, ..Default::default() };
        let fb = populated_buffer();

        match run_cycle(&mut lc, &fb, &mut det, &mut sink).unwrap() {
            CycleOutcome::Processed { sent, cmd, .. } => {
                assert!(!sent);
                assert_eq!(cmd.speed, 11);
            },
            CycleOutcome::Skipped => panic!("cycle skipped with a populated buffer")
        }

        // State still advanced
        assert_eq!(lc.speed(), 11.0);
    }
}
