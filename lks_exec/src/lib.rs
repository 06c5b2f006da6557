//! # Lane keeping library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the lane keeping crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control cycle - runs detection and control on the newest frame
pub mod cycle;

/// Debug server - publishes annotated frames
pub mod debug_server;

/// Frame buffer - holds the newest valid camera frame
pub mod frame_buffer;

/// Frame client - recieves raw frames from the camera
pub mod frame_client;

/// Lane control module - turns lane edges into a motor command
pub mod lane_ctrl;

/// Lane detection module - finds the lane edges in a frame
pub mod lane_det;

/// Motor client - publishes motor commands to the driver
pub mod motor_client;

/// Executable parameters
pub mod params;
