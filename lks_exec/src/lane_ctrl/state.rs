//! Implementations for the LaneCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::*;
use crate::lane_det::LanePosition;
use comms_if::eqpt::motor::MotorCmd;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane control module state.
///
/// Owns everything carried from one cycle to the next: the smoothing window, the steering law's
/// internal state and the speed demand.
pub struct LaneCtrl {
    params: Params,

    smoother: MovingAverage,

    steering_law: Box<dyn SteeringLaw>,

    speed_gov: SpeedGovernor,

    regime: Option<SpeedRegime>,

    report: StatusReport,
    arch_report: Archiver
}

/// Data needed to initialise LaneCtrl.
#[derive(Debug, Clone)]
pub struct InitData {
    pub params: Params,

    /// Period at which `proc` will be called, used by the PID law.
    ///
    /// Units: seconds
    pub cycle_period_s: f64
}

/// Input data to Lane Control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Lane edges reported by the detector for this cycle's frame
    pub lane: LanePosition,

    /// Width of the frame the lane edges were detected in
    pub frame_width: u32
}

/// Status report for LaneCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub left_x: f64,
    pub right_x: f64,

    /// Unsmoothed lane midpoint of this cycle
    pub midpoint_px: f64,

    pub smoothed_midpoint_px: f64,
    pub cross_track_error_px: f64,

    /// Steering law output before clamping
    pub raw_steering_deg: f64,

    /// Commanded steering angle before rounding
    pub steering_deg: f64,
    pub steering_limited: bool,
    pub steering_non_finite: bool,

    /// Speed demand after this cycle's governor update
    pub speed: f64,
    pub regime: SpeedRegime
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneCtrl {
    /// Create the module with a specific steering law, ignoring `params.steering`.
    pub fn with_steering_law(
        params: Params,
        steering_law: Box<dyn SteeringLaw>
    ) -> Result<Self, LaneCtrlError> {
        params.validate().map_err(LaneCtrlError::InvalidParams)?;

        Ok(Self {
            smoother: MovingAverage::new(params.moving_average_filter.sample_size),
            speed_gov: SpeedGovernor::new(&params.xycar),
            steering_law,
            regime: None,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            params
        })
    }

    /// Start archiving status reports into the session's archive directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), LaneCtrlError> {
        self.arch_report = Archiver::from_path(session, "lane_ctrl/status_report.csv")
            .map_err(LaneCtrlError::ArchiveError)?;
        Ok(())
    }

    /// Current speed demand.
    pub fn speed(&self) -> f64 {
        self.speed_gov.speed()
    }

    /// Smoothed lane midpoint, or `0.0` before the first cycle.
    pub fn smoothed_midpoint(&self) -> f64 {
        self.smoother.get_result()
    }

    /// Number of samples in the smoothing window.
    pub fn num_samples(&self) -> usize {
        self.smoother.len()
    }

    /// Status report of the last processed cycle.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl State for LaneCtrl {
    type InitData = InitData;
    type InitError = LaneCtrlError;

    type InputData = InputData;
    type OutputData = MotorCmd;
    type StatusReport = StatusReport;
    type ProcError = LaneCtrlError;

    /// Initialise the LaneCtrl module, building the steering law selected in the parameters.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let law: Box<dyn SteeringLaw> = match init_data.params.steering.law {
            SteeringLawKind::Stanley =>
                Box::new(StanleyController::new(&init_data.params.stanley)),
            SteeringLawKind::Pid =>
                Box::new(PidController::from_params(
                    &init_data.params.pid,
                    init_data.cycle_period_s
                ))
        };

        Self::with_steering_law(init_data.params, law)
    }

    /// Perform cyclic processing of Lane Control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if input_data.frame_width == 0 {
            return Err(LaneCtrlError::ZeroFrameWidth)
        }

        // Clear the status report
        self.report = StatusReport::default();

        let lane = input_data.lane;
        self.report.left_x = lane.left_x;
        self.report.right_x = lane.right_x;

        // Smooth the midpoint and get the error to the image centre
        let midpoint = (lane.left_x + lane.right_x) / 2.0;
        self.smoother.add_sample(midpoint);
        let smoothed = self.smoother.get_result();
        let cte = calc_cross_track_error(smoothed, input_data.frame_width);

        self.report.midpoint_px = midpoint;
        self.report.smoothed_midpoint_px = smoothed;
        self.report.cross_track_error_px = cte;

        // Steering law then clamp. The law sees the speed from the previous cycle.
        let raw_deg = self.steering_law.calc_steering_angle(
            cte,
            HEADING_ERROR_DEG,
            self.speed_gov.speed()
        );
        let steering = clamp_steering(raw_deg, STEERING_ANGLE_LIMIT_DEG);

        self.report.raw_steering_deg = raw_deg;
        self.report.steering_deg = steering.angle_deg;
        self.report.steering_limited = steering.limited;
        self.report.steering_non_finite = steering.non_finite;

        // Speed
        let regime = self.speed_gov.update(steering.angle_deg);
        if self.regime != Some(regime) {
            debug!("Speed regime is now {:?} (steering {:.1} deg)", regime, steering.angle_deg);
        }
        self.regime = Some(regime);

        self.report.speed = self.speed_gov.speed();
        self.report.regime = regime;

        let cmd = MotorCmd::from_demands(steering.angle_deg, self.speed_gov.speed());

        trace!(
            "LaneCtrl: mid {:.1} px, cte {:.1} px, raw {:.2} deg, cmd {:?}",
            smoothed, cte, raw_deg, cmd
        );

        Ok((cmd, self.report))
    }
}

impl Archived for LaneCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Steering law returning a scripted sequence of angles.
    struct ScriptedLaw {
        angles: Vec<f64>,
        calls: usize
    }

    impl SteeringLaw for ScriptedLaw {
        fn calc_steering_angle(&mut self, _: f64, _: f64, _: f64) -> f64 {
            let a = self.angles[self.calls % self.angles.len()];
            self.calls += 1;
            a
        }
    }

    fn test_params() -> Params {
        Params {
            xycar: XycarParams {
                start_speed: 10.0,
                min_speed: 5.0,
                max_speed: 20.0,
                speed_control_threshold: 10.0,
                acceleration_step: 1.0,
                deceleration_step: 2.0
            },
            stanley: StanleyParams {
                k_gain: 1.0,
                look_ahead_distance: 20.0
            },
            pid: PidParams {
                p_gain: 0.5,
                i_gain: 0.0,
                d_gain: 0.0
            },
            steering: SteeringParams::default(),
            moving_average_filter: MovingAverageParams {
                sample_size: 3
            }
        }
    }

    fn input(left_x: f64, right_x: f64) -> InputData {
        InputData {
            lane: LanePosition { left_x, right_x },
            frame_width: 640
        }
    }

    #[test]
    fn test_speed_scenario() {
        let law = ScriptedLaw { angles: vec![5.0, 15.0, 10.0], calls: 0 };
        let mut lc = LaneCtrl::with_steering_law(test_params(), Box::new(law)).unwrap();

        let mut speeds = Vec::new();
        for _ in 0..3 {
            let (cmd, rpt) = lc.proc(&input(100.0, 540.0)).unwrap();
            speeds.push(cmd.speed);
            assert_eq!(rpt.speed, cmd.speed as f64);
        }

        assert_eq!(speeds, vec![11, 9, 10]);
    }

    #[test]
    fn test_runaway_law_clamped() {
        let law = ScriptedLaw {
            angles: vec![f64::INFINITY, f64::NAN, -1e9],
            calls: 0
        };
        let mut lc = LaneCtrl::with_steering_law(test_params(), Box::new(law)).unwrap();

        let (cmd, rpt) = lc.proc(&input(0.0, 640.0)).unwrap();
        assert_eq!(cmd.angle, 50);
        assert!(rpt.steering_limited && rpt.steering_non_finite);
        assert_eq!(rpt.regime, SpeedRegime::Cautious);

        let (cmd, rpt) = lc.proc(&input(0.0, 640.0)).unwrap();
        assert_eq!(cmd.angle, 0);
        assert!(rpt.steering_non_finite);

        let (cmd, _) = lc.proc(&input(0.0, 640.0)).unwrap();
        assert_eq!(cmd.angle, -50);
    }

    #[test]
    fn test_stanley_pipeline() {
        let mut lc = LaneCtrl::init(InitData {
            params: test_params(),
            cycle_period_s: 1.0 / 33.0
        }).unwrap();

        // Lane centred on the image: only the mounting offset is left
        let (_, rpt) = lc.proc(&input(120.0, 520.0)).unwrap();
        assert_eq!(rpt.midpoint_px, 320.0);
        assert_eq!(rpt.cross_track_error_px, LATERAL_OFFSET_PX);
        assert!(rpt.steering_deg > 0.0 && rpt.steering_deg < 10.0);

        // Lane far to the left, steer left hard and slow down
        let (cmd, rpt) = lc.proc(&input(0.0, 20.0)).unwrap();
        assert!(rpt.smoothed_midpoint_px < 320.0);
        assert!(cmd.angle < -10);
        assert_eq!(rpt.regime, SpeedRegime::Cautious);
        assert_eq!(lc.num_samples(), 2);
    }

    #[test]
    fn test_lane_recovers_after_non_finite_edge() {
        let mut lc = LaneCtrl::init(InitData {
            params: test_params(),
            cycle_period_s: 1.0 / 33.0
        }).unwrap();

        let bad = InputData {
            lane: LanePosition { left_x: f64::INFINITY, right_x: 520.0 },
            frame_width: 640
        };
        let (cmd, rpt) = lc.proc(&bad).unwrap();
        assert_eq!(cmd.angle, 50);
        assert_eq!(rpt.regime, SpeedRegime::Cautious);

        // Still in the window for two more cycles
        for _ in 0..2 {
            let (_, rpt) = lc.proc(&input(120.0, 520.0)).unwrap();
            assert_eq!(rpt.regime, SpeedRegime::Cautious);
        }

        let (cmd, rpt) = lc.proc(&input(120.0, 520.0)).unwrap();
        assert_eq!(rpt.smoothed_midpoint_px, 320.0);
        assert_eq!(rpt.cross_track_error_px, LATERAL_OFFSET_PX);
        assert!(rpt.steering_deg > 0.0 && rpt.steering_deg < 10.0);
        assert!(!rpt.steering_non_finite);
        assert_eq!(rpt.regime, SpeedRegime::Cruising);
        assert_eq!(cmd.speed, 6);
    }

    #[test]
    fn test_pid_law_selected() {
        let mut params = test_params();
        params.steering.law = SteeringLawKind::Pid;

        let mut lc = LaneCtrl::init(InitData { params, cycle_period_s: 0.03 }).unwrap();

        // 0.5 * (340 - 320 + 6)
        let (cmd, _) = lc.proc(&input(140.0, 540.0)).unwrap();
        assert_eq!(cmd.angle, 13);
    }

    #[test]
    fn test_invalid_init() {
        let mut params = test_params();
        params.xycar.start_speed = 25.0;
        assert!(matches!(
            LaneCtrl::init(InitData { params, cycle_period_s: 0.03 }),
            Err(LaneCtrlError::InvalidParams(_))
        ));

        let mut lc = LaneCtrl::init(InitData {
            params: test_params(),
            cycle_period_s: 0.03
        }).unwrap();
        let bad = InputData { lane: LanePosition { left_x: 0.0, right_x: 0.0 }, frame_width: 0 };
        assert!(matches!(lc.proc(&bad), Err(LaneCtrlError::ZeroFrameWidth)));
        assert_eq!(lc.num_samples(), 0);
    }
}
