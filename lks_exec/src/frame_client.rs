//! # Frame Client
//!
//! Subscribes to the camera's raw frames and feeds them into the [`FrameBuffer`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::{
    eqpt::cam::ImageMsg,
    net::{topic, zmq, MonitoredSocket, MonitoredSocketError, SocketOptions}
};

use crate::frame_buffer::{FrameBuffer, FrameError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The frame client
pub struct FrameClient {
    socket: MonitoredSocket,

    topic: String
}

/// Counts of the messages handled by one call to [`FrameClient::service`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceReport {
    /// Frames decoded and stored
    pub accepted: usize,

    /// Messages that could not be used
    pub dropped: usize
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to {0:?}: {1}")]
    SubscribeError(String, zmq::Error),

    #[error("Could not recieve a message from the camera: {0}")]
    RecvError(zmq::Error)
}

/// Why a single message was dropped.
#[derive(Debug, thiserror::Error)]
enum DropReason {
    #[error("message is not valid UTF-8")]
    NonUtf8,

    #[error("{0}")]
    Topic(topic::TopicMsgError),

    #[error("{0}")]
    Frame(FrameError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameClient {
    /// Create a new instance of the frame client.
    ///
    /// This function will not block until the camera is available, frames simply start arriving
    /// once it is.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        topic: &str,
        queue_size: i32
    ) -> Result<Self, FrameClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 0,
            recv_hwm: queue_size,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            endpoint
        ).map_err(FrameClientError::SocketError)?;

        socket.set_subscribe(topic.as_bytes())
            .map_err(|e| FrameClientError::SubscribeError(topic.to_string(), e))?;

        Ok(Self {
            socket,
            topic: topic.to_string()
        })
    }

    /// Whether the camera publisher is currently connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive every pending message without blocking, storing each valid frame.
    ///
    /// Frames are stored in arrival order so only the newest one is left in the buffer. Messages
    /// that cannot be decoded are dropped with a warning and the buffer keeps its last valid
    /// frame.
    pub fn service(&mut self, buffer: &mut FrameBuffer) -> Result<ServiceReport, FrameClientError> {
        let mut report = ServiceReport::default();

        loop {
            let msg = match self.socket.recv_msg(zmq::DONTWAIT) {
                Ok(m) => m,
                Err(zmq::Error::EAGAIN) => break,
                Err(e) => return Err(FrameClientError::RecvError(e))
            };

            match self.intake(&msg, buffer) {
                Ok(()) => report.accepted += 1,
                Err(e) => {
                    warn!("Dropped a camera frame: {}", e);
                    report.dropped += 1;
                }
            }
        }

        Ok(report)
    }

    fn intake(&self, msg: &zmq::Message, buffer: &mut FrameBuffer) -> Result<(), DropReason> {
        let msg_str = msg.as_str().ok_or(DropReason::NonUtf8)?;

        let image: ImageMsg = topic::decode(&self.topic, msg_str)
            .map_err(DropReason::Topic)?;

        buffer.intake(&image).map_err(DropReason::Frame)
    }
}
