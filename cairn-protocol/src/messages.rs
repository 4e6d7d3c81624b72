//! Wire messages.
//!
//! JSON text frames, one tagged variant per `type` value — payloads are
//! parsed into their strongly-typed shape up front and then matched on,
//! never probed field by field.
//!
//! Inbound frames are decoded with [`ClientMessage::decode`], which keeps
//! the three failure classes distinct (invalid JSON, missing/invalid `type`,
//! unknown `type`) so sessions can report each with a precise scoped error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::pyramid::PyramidShape;

/// `type` values this protocol accepts from clients.
const CLIENT_MESSAGE_TYPES: &[&str] = &["circle_toggle", "pyramid_config", "state_request", "ping"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Missing or invalid 'type'")]
    MissingType,
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("Invalid payload for '{0}'")]
    InvalidPayload(String),
}

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CircleToggle {
        #[serde(rename = "circleId")]
        circle_id: String,
    },
    PyramidConfig {
        layers: i64,
        #[serde(rename = "bottomSize")]
        bottom_size: i64,
    },
    StateRequest,
    Ping,
}

impl ClientMessage {
    /// Decode one inbound text frame.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| DecodeError::InvalidJson)?;
        let msg_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?
            .to_string();
        if !CLIENT_MESSAGE_TYPES.contains(&msg_type.as_str()) {
            return Err(DecodeError::UnknownType(msg_type));
        }
        serde_json::from_value(value).map_err(|_| DecodeError::InvalidPayload(msg_type))
    }
}

/// A frame sent to a client, either as a private reply or a room broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateSync {
        highlighted: Vec<String>,
        layers: u32,
        #[serde(rename = "bottomSize")]
        bottom_size: u32,
    },
    CircleToggled {
        #[serde(rename = "circleId")]
        circle_id: String,
        #[serde(rename = "isHighlighted")]
        is_highlighted: bool,
    },
    ToggleRejected {
        #[serde(rename = "circleId")]
        circle_id: String,
        reason: String,
    },
    ConfigSync {
        layers: u32,
        #[serde(rename = "bottomSize")]
        bottom_size: u32,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn config_sync(shape: PyramidShape) -> Self {
        ServerMessage::ConfigSync {
            layers: shape.layers,
            bottom_size: shape.bottom_size,
        }
    }

    /// Encode for the wire. Serialization of these variants cannot fail.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("server message serializes")
    }
}
