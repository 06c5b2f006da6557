//! # Debug Server
//!
//! Publishes frames annotated with the lane estimate so they can be watched from another
//! machine. Nothing published here is ever read back by the controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::DynamicImage;

use comms_if::{
    eqpt::cam::{CamImage, DebugFrame, ImageFormat, DEBUG_TOPIC},
    net::{topic, zmq, MonitoredSocket, MonitoredSocketError, SocketOptions}
};

use crate::{
    frame_buffer::Frame,
    lane_det::{draw_lane_overlay, LanePosition}
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// JPEG quality of the published frames
const JPEG_QUALITY: u8 = 75;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Debug frame server
pub struct DebugServer {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DebugServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not encode the frame: {0}")]
    EncodeError(image::ImageError),

    #[error("Could not serialize the frame: {0}")]
    SerializationError(topic::TopicMsgError),

    #[error("Could not send the frame: {0}")]
    SendError(zmq::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DebugServer {
    /// Create a new instance of the debug server.
    ///
    /// This function will not block until a viewer connects.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, DebugServerError> {
        // Only the newest frame is worth anything to a viewer
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            linger: 0,
            send_timeout: 0,
            send_hwm: 1,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            endpoint
        ).map_err(DebugServerError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    /// Annotate the frame and publish it.
    ///
    /// Does nothing if no viewer is connected.
    pub fn send(
        &mut self,
        frame: &Frame,
        row: u32,
        lane: &LanePosition,
        estimated_x: f64
    ) -> Result<(), DebugServerError> {
        if !self.socket.connected() {
            return Ok(())
        }

        let debug_frame = build_debug_frame(frame, row, lane, estimated_x)?;

        let msg = topic::encode(DEBUG_TOPIC, &debug_frame)
            .map_err(DebugServerError::SerializationError)?;

        self.socket.send(msg.as_str(), zmq::DONTWAIT)
            .map_err(DebugServerError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Draw the overlay into a copy of the frame and JPEG encode it.
pub fn build_debug_frame(
    frame: &Frame,
    row: u32,
    lane: &LanePosition,
    estimated_x: f64
) -> Result<DebugFrame, DebugServerError> {
    let mut rgb = frame.to_rgb_image();
    draw_lane_overlay(&mut rgb, row, lane, estimated_x);

    let cam_image = CamImage {
        timestamp: frame.timestamp,
        image: DynamicImage::ImageRgb8(rgb)
    };

    let cam_frame = cam_image.to_cam_frame(ImageFormat::Jpeg(JPEG_QUALITY))
        .map_err(DebugServerError::EncodeError)?;

    Ok(DebugFrame {
        left_x: lane.left_x,
        right_x: lane.right_x,
        estimated_x,
        frame: cam_frame
    })
}
