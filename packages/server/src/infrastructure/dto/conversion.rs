//! Conversion logic between DTOs and domain entities.

use chabudai_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, DisplayName, MessageDraft, ReadStatusUpdate, Room, RoomId, RoomSnapshot,
    ServerEvent, Timestamp,
};
use crate::infrastructure::dto::{
    http::{RoomDetailDto, RoomSummaryDto},
    websocket::{
        ChatMessageDto, ErrorMessage, FrameError, IncomingChatMessage, MessageType,
        ReadStatusUpdateDto, RoomStateMessage, StatusMessage,
    },
};

fn names(users: &[DisplayName]) -> Vec<String> {
    users.iter().map(|u| u.as_str().to_string()).collect()
}

// ========================================
// DTO → Domain
// ========================================

impl IncomingChatMessage {
    /// Build a draft whose sender is the name registered for the connection.
    /// The `sender` and `read` fields of the payload are discarded.
    pub fn into_draft(self, sender: DisplayName) -> Result<MessageDraft, FrameError> {
        let room_id = self.chat_id.ok_or(FrameError::MissingRoomId)?;
        Ok(MessageDraft {
            room_id: RoomId::new(room_id)?,
            sender,
            text: self.text,
            timestamp: Timestamp::new(self.timestamp),
        })
    }
}

impl TryFrom<ReadStatusUpdateDto> for ReadStatusUpdate {
    type Error = FrameError;

    fn try_from(dto: ReadStatusUpdateDto) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: RoomId::new(dto.chat_id)?,
            timestamp: Timestamp::new(dto.timestamp),
            read: dto.read,
        })
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&ChatMessage> for ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            chat_id: model.room_id.as_str().to_string(),
            sender: model.sender.as_str().to_string(),
            text: model.text.clone(),
            timestamp: model.timestamp.value(),
            read: model.read,
        }
    }
}

impl From<&RoomSnapshot> for RoomStateMessage {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            messages: snapshot.messages.iter().map(ChatMessageDto::from).collect(),
            online_users: names(&snapshot.online_users),
        }
    }
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            online_users: names(&room.online_users()),
            message_count: room.history().len(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            online_users: names(&room.online_users()),
            messages: room.history().iter().map(ChatMessageDto::from).collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// Encode an outbound event into the JSON text frame sent to clients
pub fn encode_event(event: &ServerEvent) -> Result<String, serde_json::Error> {
    match event {
        ServerEvent::RoomState(snapshot) => serde_json::to_string(&RoomStateMessage::from(snapshot)),
        ServerEvent::Presence(users) => serde_json::to_string(&StatusMessage {
            r#type: MessageType::Status,
            online_users: names(users),
        }),
        ServerEvent::Chat(message) => serde_json::to_string(&ChatMessageDto::from(message)),
        ServerEvent::Error(error) => serde_json::to_string(&ErrorMessage {
            error: error.clone(),
        }),
    }
}
