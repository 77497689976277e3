//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::ChatMessageDto;

/// Room summary for the room list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummaryDto {
    pub id: String,
    pub online_users: Vec<String>,
    pub message_count: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Room detail including the message history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomDetailDto {
    pub id: String,
    pub online_users: Vec<String>,
    pub messages: Vec<ChatMessageDto>,
    /// RFC 3339 (UTC)
    pub created_at: String,
}
