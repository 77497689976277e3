//! UseCase 層
//!
//! ドメイン層の trait（RoomRepository / MessagePusher）だけに依存して
//! チャットハブの操作を組み立てます。状態を変更する操作は [`hub::ChatHub`]
//! のコマンドキューを通して直列化されます。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod hub;
pub mod notify_presence;
pub mod send_message;
pub mod update_read_status;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{HubError, RoomQueryError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use hub::{ChatHub, HubCommand, HubRunner};
pub use notify_presence::NotifyPresenceUseCase;
pub use send_message::SendMessageUseCase;
pub use update_read_status::UpdateReadStatusUseCase;
