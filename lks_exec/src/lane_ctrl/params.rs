//! Parameters structure for LaneCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lane control.
///
/// Each member is its own table in `lks_exec.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    pub xycar: XycarParams,

    pub stanley: StanleyParams,

    pub pid: PidParams,

    #[serde(default)]
    pub steering: SteeringParams,

    pub moving_average_filter: MovingAverageParams
}

/// Speed limits and the speed governor's tuning.
///
/// Speeds are in the motor driver's units, angles in degrees.
#[derive(Debug, Clone, Deserialize)]
pub struct XycarParams {
    /// Speed commanded on the first cycle
    pub start_speed: f64,

    pub min_speed: f64,

    pub max_speed: f64,

    /// Steering angle magnitude above which the vehicle slows down.
    ///
    /// Units: degrees
    pub speed_control_threshold: f64,

    /// Speed increase per cycle when cruising
    pub acceleration_step: f64,

    /// Speed decrease per cycle when turning hard
    pub deceleration_step: f64
}

#[derive(Debug, Clone, Deserialize)]
pub struct StanleyParams {
    /// Gain on the cross-track error
    pub k_gain: f64,

    /// Distance scaling the speed term, must be positive
    pub look_ahead_distance: f64
}

#[derive(Debug, Clone, Deserialize)]
pub struct PidParams {
    pub p_gain: f64,
    pub i_gain: f64,
    pub d_gain: f64
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SteeringParams {
    #[serde(default)]
    pub law: SteeringLawKind
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovingAverageParams {
    /// Number of midpoint samples averaged
    pub sample_size: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which steering law drives the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteeringLawKind {
    Stanley,
    Pid
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SteeringLawKind {
    fn default() -> Self {
        SteeringLawKind::Stanley
    }
}

impl Params {
    /// Check the parameters can be used to drive the vehicle.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let x = &self.xycar;

        check_finite("xycar.start_speed", x.start_speed)?;
        check_finite("xycar.min_speed", x.min_speed)?;
        check_finite("xycar.max_speed", x.max_speed)?;
        check_finite("xycar.speed_control_threshold", x.speed_control_threshold)?;
        check_finite("xycar.acceleration_step", x.acceleration_step)?;
        check_finite("xycar.deceleration_step", x.deceleration_step)?;
        check_finite("stanley.k_gain", self.stanley.k_gain)?;
        check_finite("stanley.look_ahead_distance", self.stanley.look_ahead_distance)?;
        check_finite("pid.p_gain", self.pid.p_gain)?;
        check_finite("pid.i_gain", self.pid.i_gain)?;
        check_finite("pid.d_gain", self.pid.d_gain)?;

        if !(0.0 <= x.min_speed && x.min_speed <= x.start_speed && x.start_speed <= x.max_speed) {
            return Err(ParamsError::SpeedBounds {
                min: x.min_speed,
                start: x.start_speed,
                max: x.max_speed
            })
        }

        // Stanley saturates at zero speed, so the vehicle would turn hard and never speed up
        if self.steering.law == SteeringLawKind::Stanley && x.min_speed <= 0.0 {
            return Err(ParamsError::NotPositive("xycar.min_speed", x.min_speed))
        }

        if x.acceleration_step <= 0.0 {
            return Err(ParamsError::NotPositive("xycar.acceleration_step", x.acceleration_step))
        }
        if x.deceleration_step <= 0.0 {
            return Err(ParamsError::NotPositive("xycar.deceleration_step", x.deceleration_step))
        }
        if x.speed_control_threshold < 0.0 {
            return Err(ParamsError::Negative(
                "xycar.speed_control_threshold",
                x.speed_control_threshold
            ))
        }
        if self.stanley.look_ahead_distance <= 0.0 {
            return Err(ParamsError::NotPositive(
                "stanley.look_ahead_distance",
                self.stanley.look_ahead_distance
            ))
        }
        if self.moving_average_filter.sample_size == 0 {
            return Err(ParamsError::EmptyWindow)
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() {
        Ok(())
    }
    else {
        Err(ParamsError::NonFinite(name))
    }
}
