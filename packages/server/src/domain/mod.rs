//! ドメイン層
//!
//! チャットハブの状態（Room・参加者・履歴）と、それを操作するための
//! インターフェース（Repository / MessagePusher）を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{ChatMessage, Member, MessageDraft, ReadStatusUpdate, Room, RoomSnapshot};
pub use error::{MessagePushError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel, ServerEvent};
pub use repository::{Delivery, LeaveOutcome, Presence, ReadStatusDelivery, RoomRepository};
pub use value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockRoomRepository;
