//! # Speed governor
//!
//! Ramps the commanded speed down through sharp turns and back up on straights.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::XycarParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Persisted speed demand and the limits it moves within.
#[derive(Debug, Clone)]
pub struct SpeedGovernor {
    speed: f64,
    min_speed: f64,
    max_speed: f64,
    acceleration_step: f64,
    deceleration_step: f64,
    threshold_deg: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Regime selected on each cycle from the clamped steering angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedRegime {
    /// Turning harder than the threshold, decelerating.
    Cautious,

    /// Turning at or below the threshold, accelerating.
    Cruising
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SpeedRegime {
    fn default() -> Self {
        SpeedRegime::Cruising
    }
}

impl SpeedRegime {
    /// Select the regime. The comparison is strict, an angle exactly on the threshold cruises.
    pub fn from_steering(angle_deg: f64, threshold_deg: f64) -> Self {
        if angle_deg.abs() > threshold_deg {
            SpeedRegime::Cautious
        }
        else {
            SpeedRegime::Cruising
        }
    }
}

impl SpeedGovernor {
    pub fn new(params: &XycarParams) -> Self {
        Self {
            speed: params.start_speed.max(params.min_speed).min(params.max_speed),
            min_speed: params.min_speed,
            max_speed: params.max_speed,
            acceleration_step: params.acceleration_step,
            deceleration_step: params.deceleration_step,
            threshold_deg: params.speed_control_threshold
        }
    }

    /// Current speed demand.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Move the speed one step in the direction chosen by the clamped steering angle.
    pub fn update(&mut self, clamped_angle_deg: f64) -> SpeedRegime {
        let regime = SpeedRegime::from_steering(clamped_angle_deg, self.threshold_deg);

        self.speed = match regime {
            SpeedRegime::Cautious => (self.speed - self.deceleration_step).max(self.min_speed),
            SpeedRegime::Cruising => (self.speed + self.acceleration_step).min(self.max_speed)
        };

        regime
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lane_ctrl::{clamp_steering, STEERING_ANGLE_LIMIT_DEG};
    use proptest::prelude::*;

    fn params() -> XycarParams {
        XycarParams {
            start_speed: 10.0,
            min_speed: 5.0,
            max_speed: 20.0,
            speed_control_threshold: 10.0,
            acceleration_step: 1.0,
            deceleration_step: 2.0
        }
    }

    #[test]
    fn test_ramp() {
        let mut gov = SpeedGovernor::new(&params());

        assert_eq!(gov.update(5.0), SpeedRegime::Cruising);
        assert_eq!(gov.speed(), 11.0);

        assert_eq!(gov.update(-15.0), SpeedRegime::Cautious);
        assert_eq!(gov.speed(), 9.0);

        // Boundary accelerates
        assert_eq!(gov.update(10.0), SpeedRegime::Cruising);
        assert_eq!(gov.speed(), 10.0);
        assert_eq!(gov.update(-10.0), SpeedRegime::Cruising);
        assert_eq!(gov.speed(), 11.0);
    }

    #[test]
    fn test_saturation() {
        let p = params();
        let mut gov = SpeedGovernor::new(&p);

        for _ in 0..100 {
            gov.update(50.0);
        }
        assert_eq!(gov.speed(), p.min_speed);

        for _ in 0..100 {
            gov.update(0.0);
        }
        assert_eq!(gov.speed(), p.max_speed);
    }

    proptest! {
        /// Speed stays within the limits for any sequence of steering angles
        #[test]
        fn prop_speed_within_bounds(
            angles in prop::collection::vec(prop::num::f64::ANY, 0..200)
        ) {
            let p = params();
            let mut gov = SpeedGovernor::new(&p);

            for raw in angles {
                let angle = clamp_steering(raw, STEERING_ANGLE_LIMIT_DEG).angle_deg;
                let before = gov.speed();

                let regime = gov.update(angle);
                prop_assert!(gov.speed() >= p.min_speed && gov.speed() <= p.max_speed);

                // At most one step per cycle, in the direction of the regime
                match regime {
                    SpeedRegime::Cautious => prop_assert!(
                        gov.speed() <= before && before - gov.speed() <= p.deceleration_step
                    ),
                    SpeedRegime::Cruising => prop_assert!(
                        gov.speed() >= before && gov.speed() - before <= p.acceleration_step
                    )
                }
            }
        }

        /// The threshold itself never decelerates
        #[test]
        fn prop_threshold_cruises(threshold in 0.0f64..90.0, sign in prop::bool::ANY) {
            let angle = if sign { threshold } else { -threshold };
            prop_assert_eq!(SpeedRegime::from_steering(angle, threshold), SpeedRegime::Cruising);
        }
    }
}
