//! # Lane control module
//!
//! Turns the detected lane edges into a motor command: the midpoint is smoothed, compared with
//! the image centre, passed through a steering law and clamped, then the speed governor picks
//! the speed for the resulting angle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod smoother;
mod speed_gov;
mod state;
mod steering;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use smoother::*;
pub use speed_gov::*;
pub use state::*;
pub use steering::*;

use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Physical steering limit of the vehicle.
///
/// Units: degrees
pub const STEERING_ANGLE_LIMIT_DEG: f64 = 50.0;

/// Calibration offset for the camera not being mounted on the vehicle centreline.
///
/// Units: pixels
pub const LATERAL_OFFSET_PX: f64 = 6.0;

/// Heading error fed to the steering law. There is no heading sensor so this is always zero.
///
/// Units: degrees
pub const HEADING_ERROR_DEG: f64 = 0.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LaneCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LaneCtrlError {
    #[error("Invalid lane control parameters: {0}")]
    InvalidParams(ParamsError),

    #[error("Cannot compute the cross-track error of a frame with zero width")]
    ZeroFrameWidth,

    #[error("Could not initialise the archive: {0}")]
    ArchiveError(util::archive::ArchiveError)
}
