//! Parameters structure for lane detection

use serde::Deserialize;

use crate::params::ParamsError;

/// Tuning of the row scan detector.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Row scanned for lane markings, as a fraction of the frame height from the top.
    pub scan_row_ratio: f64,

    /// Minimum grey level of a lane marking pixel.
    pub threshold: u8,

    /// Narrowest run of bright pixels accepted as a marking.
    ///
    /// Units: pixels
    pub min_run_px: u32
}

impl Params {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.scan_row_ratio) {
            return Err(ParamsError::OutOfRange("lane_det.scan_row_ratio", self.scan_row_ratio))
        }
        if self.min_run_px == 0 {
            return Err(ParamsError::NotPositive("lane_det.min_run_px", 0.0))
        }

        Ok(())
    }
}
