//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the equipment: frames
//! coming from the camera and commands going to the motor driver.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod motor;
