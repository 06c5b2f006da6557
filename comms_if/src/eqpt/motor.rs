//! # Motor Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command sent to the motor driver once per control cycle.
///
/// Both values are in the actuator's integral units.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MotorCmd {
    /// Steering angle demand. Negative values steer left.
    pub angle: i32,

    /// Speed demand, never negative.
    pub speed: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorCmd {
    /// Build a command by rounding continuous demands to the actuator's units.
    ///
    /// Rounding is half away from zero. Non-finite values map to zero and the speed is floored at
    /// zero.
    pub fn from_demands(angle: f64, speed: f64) -> Self {
        Self {
            angle: round_to_units(angle),
            speed: round_to_units(speed).max(0),
        }
    }
}

fn round_to_units(value: f64) -> i32 {
    if value.is_finite() {
        // `as` saturates at the i32 bounds
        value.round() as i32
    } else {
        0
    }
}
