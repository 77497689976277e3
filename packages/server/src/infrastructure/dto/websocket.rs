//! WebSocket message DTOs.
//!
//! Inbound frames are decoded into the closed set [`IncomingFrame`]; outbound
//! frames are the JSON shapes clients already understand (`messages` /
//! `onlineUsers` snapshot, `type: "status"` presence, plain chat message,
//! `error`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ValueObjectError;

/// Value of the `update` marker field identifying a read-status update.
pub const READ_UPDATE_MARKER: &str = "read";

/// Error frame text for a chat message without `chat_id`.
pub const MISSING_CHAT_ID_ERROR: &str = "chat_id is required";

/// Errors raised while decoding an inbound text frame
#[derive(Debug, Error)]
pub enum FrameError {
    /// Undecodable JSON or a shape that matches neither known message
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `update` field with a value other than "read"
    #[error("unsupported update kind '{0}'")]
    UnsupportedUpdate(String),

    /// Chat message without a room identifier
    #[error("{}", MISSING_CHAT_ID_ERROR)]
    MissingRoomId,

    /// Room identifier or sender rejected by the domain
    #[error("invalid value: {0}")]
    InvalidValue(#[from] ValueObjectError),
}

/// Message type tag for tagged outbound frames
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Status,
}

/// Chat message as it travels on the wire (both directions of a broadcast)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageDto {
    pub chat_id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
    pub read: bool,
}

/// Full room state sent once to a newly joined connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomStateMessage {
    pub messages: Vec<ChatMessageDto>,
    #[serde(rename = "onlineUsers")]
    pub online_users: Vec<String>,
}

/// Presence update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub r#type: MessageType,
    #[serde(rename = "onlineUsers")]
    pub online_users: Vec<String>,
}

/// Error reported back to the sender only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorMessage {
    pub error: String,
}

/// Chat message sent by a client. `sender` and `read` are accepted but ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IncomingChatMessage {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub read: bool,
}

/// Read-status update sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadStatusUpdateDto {
    pub update: String,
    pub chat_id: String,
    pub timestamp: i64,
    pub read: bool,
}

impl ReadStatusUpdateDto {
    pub fn new(chat_id: String, timestamp: i64, read: bool) -> Self {
        Self {
            update: READ_UPDATE_MARKER.to_string(),
            chat_id,
            timestamp,
            read,
        }
    }
}

/// Closed set of inbound frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingFrame {
    Chat(IncomingChatMessage),
    ReadStatus(ReadStatusUpdateDto),
}

impl IncomingFrame {
    /// Decode a text frame.
    ///
    /// The `update` marker selects the read-status shape; frames without it
    /// must be a chat message carrying a non-empty `chat_id`.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        let marker = match value.get("update") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(kind)) => Some(kind.clone()),
            Some(other) => return Err(FrameError::UnsupportedUpdate(other.to_string())),
        };

        match marker.as_deref() {
            None => {
                let chat: IncomingChatMessage = serde_json::from_value(value)?;
                if chat.chat_id.as_deref().is_some_and(|id| !id.is_empty()) {
                    Ok(Self::Chat(chat))
                } else {
                    Err(FrameError::MissingRoomId)
                }
            }
            Some(READ_UPDATE_MARKER) => Ok(Self::ReadStatus(serde_json::from_value(value)?)),
            Some(kind) => Err(FrameError::UnsupportedUpdate(kind.to_string())),
        }
    }
}

/// Any frame the server sends, as seen by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    RoomState(RoomStateMessage),
    Status(StatusMessage),
    Chat(ChatMessageDto),
    Error(ErrorMessage),
}

impl ServerFrame {
    /// Decode a text frame sent by the server
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if value.get("type").is_some() {
            Ok(Self::Status(serde_json::from_value(value)?))
        } else if value.get("messages").is_some() {
            Ok(Self::RoomState(serde_json::from_value(value)?))
        } else if value.get("error").is_some() {
            Ok(Self::Error(serde_json::from_value(value)?))
        } else {
            Ok(Self::Chat(serde_json::from_value(value)?))
        }
    }
}
