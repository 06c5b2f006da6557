//! # Lane detection module
//!
//! Finds the horizontal position of the left and right lane markings in a frame.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod overlay;
mod params;
mod row_scan;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::frame_buffer::Frame;

pub use overlay::*;
pub use params::*;
pub use row_scan::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Horizontal position of both lane edges.
///
/// Units: pixels from the left edge of the frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LanePosition {
    pub left_x: f64,
    pub right_x: f64
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything that can locate the lane edges in a frame.
///
/// A detector that cannot find a lane edge still returns a position, it is up to the
/// implementation to choose which. Callers treat the result as a plain value.
pub trait LaneDetector {
    fn get_lane_position(&mut self, frame: &Frame) -> LanePosition;

    /// Image row the detector looked at on the last call, if it works on a single row.
    fn scan_row(&self) -> Option<u32> {
        None
    }
}
