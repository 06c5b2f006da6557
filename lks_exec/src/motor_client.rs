//! # Motor Client
//!
//! Publishes motor commands to the motor driver.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::motor::MotorCmd,
    net::{topic, zmq, MonitoredSocket, MonitoredSocketError, SocketOptions}
};

use crate::cycle::CmdSink;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The motor client
pub struct MotorClient {
    socket: MonitoredSocket,

    topic: String
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MotorClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the command: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the command: {0}")]
    SerializationError(topic::TopicMsgError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorClient {
    /// Create a new instance of the motor client, bound on `endpoint`.
    ///
    /// At most `queue_size` commands are held for a slow driver, newer commands are dropped
    /// beyond that.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        topic: &str,
        queue_size: i32
    ) -> Result<Self, MotorClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 0,
            send_timeout: 0,
            send_hwm: queue_size,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            endpoint
        ).map_err(MotorClientError::SocketError)?;

        Ok(Self {
            socket,
            topic: topic.to_string()
        })
    }

    /// Whether a motor driver is currently connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Publish a command without waiting for any acknowledgement.
    pub fn send(&mut self, cmd: &MotorCmd) -> Result<(), MotorClientError> {
        let msg = topic::encode(&self.topic, cmd)
            .map_err(MotorClientError::SerializationError)?;

        self.socket.send(msg.as_str(), zmq::DONTWAIT)
            .map_err(MotorClientError::SendError)
    }
}

impl CmdSink for MotorClient {
    type Error = MotorClientError;

    fn send(&mut self, cmd: &MotorCmd) -> Result<(), Self::Error> {
        MotorClient::send(self, cmd)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_commands_published() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://motor_client_test";

        let mut client = MotorClient::new(&ctx, endpoint, "/xycar_motor", 10).unwrap();

        let sub = ctx.socket(zmq::SUB).unwrap();
        sub.connect(endpoint).unwrap();
        sub.set_subscribe(b"/xycar_motor").unwrap();
        sub.set_rcvtimeo(10).unwrap();

        let cmd = MotorCmd { angle: -12, speed: 7 };
        let start = Instant::now();
        let mut received = None;

        // Subscriptions propagate asynchronously, keep sending until one gets through
        while received.is_none() && start.elapsed() < Duration::from_secs(5) {
            CmdSink::send(&mut client, &cmd).unwrap();

            if let Ok(msg) = sub.recv_string(0) {
                received = msg.ok().map(|s| topic::decode::<MotorCmd>("/xycar_motor", &s).unwrap());
            }
        }

        assert_eq!(received, Some(cmd));
    }
}
