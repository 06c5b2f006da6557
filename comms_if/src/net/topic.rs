//! # Topic framing
//!
//! PUB/SUB messages are sent as a single frame `"<topic> <json payload>"`. ZMQ subscriptions only
//! filter on a byte prefix, so `/cam` would also let `/camera` through; [`decode`] checks the full
//! topic before deserialising.

use serde::{de::DeserializeOwned, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum TopicMsgError {
    #[error("Message is not on the expected topic {0:?}")]
    WrongTopic(String),

    #[error("Could not serialize the payload: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the payload: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a topic name can be used for framing: not empty and without whitespace.
pub fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.chars().any(char::is_whitespace)
}

/// Frame the payload on the given topic.
pub fn encode<T: Serialize>(topic: &str, payload: &T) -> Result<String, TopicMsgError> {
    let json = serde_json::to_string(payload)
        .map_err(TopicMsgError::SerializationError)?;

    Ok(format!("{} {}", topic, json))
}

/// Extract the payload of a message framed on the given topic.
pub fn decode<T: DeserializeOwned>(topic: &str, msg: &str) -> Result<T, TopicMsgError> {
    let payload = msg
        .strip_prefix(topic)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| TopicMsgError::WrongTopic(topic.to_string()))?;

    serde_json::from_str(payload).map_err(TopicMsgError::DeserializeError)
}
