//! # Lane Keeping Executable Parameters
//!
//! Everything in `lks_exec.toml`. The parameters are loaded once at startup and checked with
//! [`LksExecParams::validate`] before the control loop is allowed to run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use comms_if::net::topic::is_valid_topic;
use crate::{lane_ctrl, lane_det};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LksExecParams {

    /// Publish annotated frames on the debug endpoint
    pub debug: bool,

    pub topic: TopicParams,

    /// Lane control tables (`[xycar]`, `[stanley]`, `[pid]`, `[steering]`,
    /// `[moving_average_filter]`)
    #[serde(flatten)]
    pub lane_ctrl: lane_ctrl::Params,

    pub lane_det: lane_det::Params
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicParams {
    /// Topic motor commands are published on
    pub pub_name: String,

    /// Topic camera frames arrive on
    pub sub_name: String,

    /// Number of messages buffered by the transport on each socket
    pub queue_size: i32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A parameter that was loaded but cannot be used.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),

    #[error("Speeds must satisfy 0 <= min ({min}) <= start ({start}) <= max ({max})")]
    SpeedBounds { min: f64, start: f64, max: f64 },

    #[error("{0} must be greater than zero, found {1}")]
    NotPositive(&'static str, f64),

    #[error("{0} must not be negative, found {1}")]
    Negative(&'static str, f64),

    #[error("{0} is out of range, found {1}")]
    OutOfRange(&'static str, f64),

    #[error("moving_average_filter.sample_size must be at least 1")]
    EmptyWindow,

    #[error("topic.queue_size must be greater than zero, found {0}")]
    QueueSize(i32),

    #[error("{0} is not a valid topic name: {1:?}")]
    InvalidTopic(&'static str, String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LksExecParams {
    /// Check every section of the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.topic.validate()?;
        self.lane_ctrl.validate()?;
        self.lane_det.validate()
    }
}

impl TopicParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !is_valid_topic(&self.pub_name) {
            return Err(ParamsError::InvalidTopic("topic.pub_name", self.pub_name.clone()))
        }
        if !is_valid_topic(&self.sub_name) {
            return Err(ParamsError::InvalidTopic("topic.sub_name", self.sub_name.clone()))
        }
        if self.queue_size <= 0 {
            return Err(ParamsError::QueueSize(self.queue_size))
        }

        Ok(())
    }
}
