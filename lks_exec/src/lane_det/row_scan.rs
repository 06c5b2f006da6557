//! # Row scan detector
//!
//! Looks along a single image row for runs of bright pixels. The run closest to the centre on
//! each side is taken as that side's lane marking.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use super::{LaneDetector, LanePosition, Params};
use crate::frame_buffer::Frame;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Single row lane marking detector.
///
/// When a side has no marking the position found on the last cycle is reused. Before anything
/// has been found the left edge defaults to `0` and the right to the frame width.
#[derive(Debug, Clone)]
pub struct RowScanDetector {
    params: Params,
    prev_left_x: Option<f64>,
    prev_right_x: Option<f64>,
    last_row: Option<u32>
}

/// A run of pixels above the threshold, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Run {
    start: u32,
    end: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RowScanDetector {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            prev_left_x: None,
            prev_right_x: None,
            last_row: None
        }
    }

    fn find_runs(&self, frame: &Frame, row: u32) -> Vec<Run> {
        let mut runs = Vec::new();
        let mut start = None;

        for x in 0..frame.width() {
            let bright = grey(frame.image.get_pixel(x, row).0) >= self.params.threshold;

            match (bright, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    runs.push(Run { start: s, end: x });
                    start = None;
                },
                _ => ()
            }
        }
        if let Some(s) = start {
            runs.push(Run { start: s, end: frame.width() });
        }

        runs.retain(|r| r.end - r.start >= self.params.min_run_px);
        runs
    }
}

impl LaneDetector for RowScanDetector {
    fn get_lane_position(&mut self, frame: &Frame) -> LanePosition {
        if frame.width() == 0 || frame.height() == 0 {
            return LanePosition {
                left_x: self.prev_left_x.unwrap_or(0.0),
                right_x: self.prev_right_x.unwrap_or(frame.width() as f64)
            }
        }

        let row = ((frame.height() - 1) as f64 * self.params.scan_row_ratio).round() as u32;
        let row = row.min(frame.height() - 1);
        self.last_row = Some(row);

        let centre = frame.width() as f64 / 2.0;
        let runs = self.find_runs(frame, row);

        // Inner edge of the closest marking on each side
        let left = runs.iter()
            .filter(|r| r.centre() < centre)
            .map(|r| r.end as f64)
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))));
        let right = runs.iter()
            .filter(|r| r.centre() >= centre)
            .map(|r| r.start as f64)
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))));

        if left.is_none() || right.is_none() {
            trace!("Row {}: left marking found: {}, right marking found: {}",
                row, left.is_some(), right.is_some());
        }

        let left_x = left.or(self.prev_left_x).unwrap_or(0.0);
        let right_x = right.or(self.prev_right_x).unwrap_or(frame.width() as f64);

        self.prev_left_x = Some(left_x);
        self.prev_right_x = Some(right_x);

        LanePosition { left_x, right_x }
    }

    fn scan_row(&self) -> Option<u32> {
        self.last_row
    }
}

impl Run {
    fn centre(&self) -> f64 {
        (self.start + self.end) as f64 / 2.0
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Luma of a BGR pixel.
fn grey(bgr: [u8; 3]) -> u8 {
    let [b, g, r] = bgr;
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame_buffer::BgrImage;
    use chrono::Utc;
    use image::Bgr;

    fn params() -> Params {
        Params {
            scan_row_ratio: 0.5,
            threshold: 128,
            min_run_px: 3
        }
    }

    /// Dark frame with white vertical bands at the given columns.
    fn frame(width: u32, height: u32, bands: &[(u32, u32)]) -> Frame {
        let image = BgrImage::from_fn(width, height, |x, _| {
            if bands.iter().any(|(s, e)| x >= *s && x < *e) {
                Bgr([255, 255, 255])
            }
            else {
                Bgr([20, 20, 20])
            }
        });

        Frame { timestamp: Utc::now(), image }
    }

    #[test]
    fn test_two_markings() {
        let mut det = RowScanDetector::new(params());
        let f = frame(100, 10, &[(10, 15), (80, 86)]);

        assert_eq!(det.get_lane_position(&f), LanePosition { left_x: 15.0, right_x: 80.0 });
        assert_eq!(det.scan_row(), Some(5));
    }

    #[test]
    fn test_closest_marking_wins_and_noise_ignored() {
        let mut det = RowScanDetector::new(params());

        // Outer markings, inner markings and a 1 pixel speck
        let f = frame(100, 10, &[(0, 4), (20, 25), (49, 50), (70, 74), (95, 100)]);

        assert_eq!(det.get_lane_position(&f), LanePosition { left_x: 25.0, right_x: 70.0 });
    }

    #[test]
    fn test_missing_side_holds_previous() {
        let mut det = RowScanDetector::new(params());

        // Nothing found yet
        let empty = frame(100, 10, &[]);
        assert_eq!(det.get_lane_position(&empty), LanePosition { left_x: 0.0, right_x: 100.0 });

        let both = frame(100, 10, &[(10, 15), (80, 86)]);
        det.get_lane_position(&both);

        let only_right = frame(100, 10, &[(70, 75)]);
        assert_eq!(det.get_lane_position(&only_right), LanePosition { left_x: 15.0, right_x: 70.0 });

        assert_eq!(det.get_lane_position(&empty), LanePosition { left_x: 15.0, right_x: 70.0 });
    }

    #[test]
    fn test_grey() {
        assert_eq!(grey([0, 0, 0]), 0);
        assert_eq!(grey([255, 255, 255]), 255);
        // Pure red is brighter than pure blue
        assert!(grey([0, 0, 255]) > grey([255, 0, 0]));
    }
}
