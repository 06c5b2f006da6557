//! # Debug overlay
//!
//! Marker boxes drawn over a frame to show what the detector and controller saw.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{Rgb, RgbImage};

use super::LanePosition;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const LANE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const ESTIMATE_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTRE_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);

/// Half the side of a marker box.
///
/// Units: pixels
const MARKER_HALF_SIZE: i64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Draw the lane edges, the estimated midpoint and the image centre on the given row.
pub fn draw_lane_overlay(image: &mut RgbImage, row: u32, lane: &LanePosition, estimated_x: f64) {
    let centre_x = image.width() as f64 / 2.0;

    draw_marker(image, lane.left_x, row, LANE_COLOUR);
    draw_marker(image, lane.right_x, row, LANE_COLOUR);
    draw_marker(image, estimated_x, row, ESTIMATE_COLOUR);
    draw_marker(image, centre_x, row, CENTRE_COLOUR);
}

/// Outline of a square centred on `(x, y)`, clipped to the image.
fn draw_marker(image: &mut RgbImage, x: f64, y: u32, colour: Rgb<u8>) {
    if !x.is_finite() {
        return
    }

    let cx = x.round() as i64;
    let cy = y as i64;
    let (w, h) = (image.width() as i64, image.height() as i64);

    for dy in -MARKER_HALF_SIZE..=MARKER_HALF_SIZE {
        for dx in -MARKER_HALF_SIZE..=MARKER_HALF_SIZE {
            let edge = dx.abs() == MARKER_HALF_SIZE || dy.abs() == MARKER_HALF_SIZE;
            let (px, py) = (cx + dx, cy + dy);

            if edge && px >= 0 && px < w && py >= 0 && py < h {
                image.put_pixel(px as u32, py as u32, colour);
            }
        }
    }
}
