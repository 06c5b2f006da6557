//! # Steering laws
//!
//! Steering laws turn the cross-track error into a raw steering angle. Their output is not
//! trusted, every value goes through [`clamp_steering`] before it reaches the actuator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{LATERAL_OFFSET_PX, PidParams, StanleyParams};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A law mapping the lateral and heading errors and the vehicle speed to a steering angle.
///
/// Angles are in the actuator's degree units, positive to the right.
pub trait SteeringLaw: Send {
    fn calc_steering_angle(
        &mut self,
        cross_track_error: f64,
        heading_error_deg: f64,
        speed: f64
    ) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stanley lateral controller.
#[derive(Debug, Clone, Serialize)]
pub struct StanleyController {
    k_gain: f64,
    look_ahead_distance: f64
}

/// A PID controller run at a fixed period.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Time between two calls to `get`.
    ///
    /// Units: seconds
    dt_s: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

/// Result of clamping a raw steering angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedSteering {
    /// The angle to command, always within the limit.
    pub angle_deg: f64,

    /// True if the raw angle was outside the limit.
    pub limited: bool,

    /// True if the raw angle was NaN or infinite.
    pub non_finite: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StanleyController {
    pub fn new(params: &StanleyParams) -> Self {
        Self {
            k_gain: params.k_gain,
            look_ahead_distance: params.look_ahead_distance
        }
    }
}

impl SteeringLaw for StanleyController {
    /// `heading + atan2(k * cte, look_ahead * speed)`
    ///
    /// At zero speed the correction saturates at +/- 90 degrees.
    fn calc_steering_angle(
        &mut self,
        cross_track_error: f64,
        heading_error_deg: f64,
        speed: f64
    ) -> f64 {
        let correction_rad = (self.k_gain * cross_track_error)
            .atan2(self.look_ahead_distance * speed.max(0.0));

        heading_error_deg + correction_rad.to_degrees()
    }
}

impl PidController {

    /// Create a new controller with the given gains, to be called every `dt_s` seconds.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, dt_s: f64) -> Self {
        Self {
            k_p, k_i, k_d, dt_s,
            integral: 0f64,
            prev_error: None
        }
    }

    pub fn from_params(params: &PidParams, dt_s: f64) -> Self {
        Self::new(params.p_gain, params.i_gain, params.d_gain, dt_s)
    }

    /// Get the value of the controller for the given error.
    pub fn get(&mut self, error: f64) -> f64 {
        self.integral += error * self.dt_s;

        // No derivative kick on the first call
        let deriv = match self.prev_error {
            Some(e) if self.dt_s > 0.0 => (error - e) / self.dt_s,
            _ => 0f64
        };

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }
}

impl SteeringLaw for PidController {
    /// PID on the cross-track error only, heading and speed are not used.
    fn calc_steering_angle(
        &mut self,
        cross_track_error: f64,
        _heading_error_deg: f64,
        _speed: f64
    ) -> f64 {
        self.get(cross_track_error)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Lateral error between the lane midpoint and the centre of the image, in pixels.
///
/// Positive when the lane centre lies to the right of the vehicle.
pub fn calc_cross_track_error(midpoint_px: f64, frame_width: u32) -> f64 {
    midpoint_px - frame_width as f64 / 2.0 + LATERAL_OFFSET_PX
}

/// Clip a raw steering angle symmetrically to `[-limit, +limit]`.
///
/// NaN maps to zero (straight ahead). Infinities saturate at the limit of the same sign.
pub fn clamp_steering(raw_deg: f64, limit_deg: f64) -> ClampedSteering {
    let limit = limit_deg.abs();

    if raw_deg.is_nan() {
        return ClampedSteering {
            angle_deg: 0.0,
            limited: true,
            non_finite: true
        }
    }

    let angle_deg = raw_deg.max(-limit).min(limit);

    ClampedSteering {
        angle_deg,
        limited: angle_deg != raw_deg,
        non_finite: raw_deg.is_infinite()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_bounds() {
        let limit = 50.0;
        let inputs = [
            0.0, 12.5, -12.5, 50.0, -50.0, 50.0001, -73.0, 1e300, -1e300,
            f64::INFINITY, f64::NEG_INFINITY, f64::NAN, f64::MIN_POSITIVE
        ];

        for raw in inputs.iter() {
            let c = clamp_steering(*raw, limit);
            assert!(c.angle_deg.abs() <= limit, "{} -> {}", raw, c.angle_deg);
            assert!(c.angle_deg.is_finite());
        }

        assert_eq!(clamp_steering(12.5, limit).angle_deg, 12.5);
        assert!(!clamp_steering(50.0, limit).limited);
        assert_eq!(clamp_steering(-73.0, limit).angle_deg, -50.0);
        assert!(clamp_steering(-73.0, limit).limited);

        let c = clamp_steering(f64::INFINITY, limit);
        assert_eq!(c.angle_deg, 50.0);
        assert!(c.non_finite && c.limited);

        let c = clamp_steering(f64::NAN, limit);
        assert_eq!(c.angle_deg, 0.0);
        assert!(c.non_finite);
    }

    #[test]
    fn test_cross_track_error() {
        // Midpoint on the image centre leaves only the mounting offset
        assert_eq!(calc_cross_track_error(320.0, 640), LATERAL_OFFSET_PX);
        assert_eq!(calc_cross_track_error(300.0, 640), -20.0 + LATERAL_OFFSET_PX);

        // Half pixels are kept for odd widths and midpoints
        assert_eq!(calc_cross_track_error(320.0, 641), -0.5 + LATERAL_OFFSET_PX);
        assert_eq!(calc_cross_track_error(320.5, 640), 0.5 + LATERAL_OFFSET_PX);
    }

    #[test]
    fn test_stanley() {
        let mut s = StanleyController::new(&StanleyParams {
            k_gain: 1.0,
            look_ahead_distance: 1.0
        });

        assert_eq!(s.calc_steering_angle(0.0, 0.0, 10.0), 0.0);
        assert!((s.calc_steering_angle(10.0, 0.0, 10.0) - 45.0).abs() < 1e-9);
        assert!((s.calc_steering_angle(-10.0, 0.0, 10.0) + 45.0).abs() < 1e-9);
        assert!((s.calc_steering_angle(10.0, 5.0, 10.0) - 50.0).abs() < 1e-9);

        // Saturates at zero speed
        assert!((s.calc_steering_angle(1.0, 0.0, 0.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_pid() {
        let mut pid = PidController::new(2.0, 1.0, 0.5, 0.1);

        // P + I, no derivative on the first call
        assert!((pid.get(1.0) - (2.0 + 0.1)).abs() < 1e-12);

        // Second call: integral 0.1 + 0.3, derivative (3 - 1) / 0.1 = 20
        assert!((pid.get(3.0) - (6.0 + 0.4 + 10.0)).abs() < 1e-9);

        let mut p_only = PidController::new(0.5, 0.0, 0.0, 0.03);
        assert_eq!(p_only.calc_steering_angle(-40.0, 12.0, 9.0), -20.0);
    }

    proptest! {
        /// Any raw angle, NaN and infinities included, ends up within the limit
        #[test]
        fn prop_clamp_within_limit(raw in prop::num::f64::ANY, limit in 0.0f64..180.0) {
            let c = clamp_steering(raw, limit);

            prop_assert!(c.angle_deg.is_finite());
            prop_assert!(c.angle_deg.abs() <= limit);
            prop_assert_eq!(c.non_finite, !raw.is_finite());

            if raw.is_finite() && raw.abs() <= limit {
                prop_assert_eq!(c.angle_deg, raw);
                prop_assert!(!c.limited);
            }
        }
    }
}
