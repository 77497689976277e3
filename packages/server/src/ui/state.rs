//! Shared application state.

use std::sync::Arc;

use crate::{
    config::HeartbeatConfig,
    domain::RoomId,
    usecase::{ChatHub, GetRoomDetailUseCase, GetRoomsUseCase},
};

/// State shared by every handler
pub struct AppState {
    /// ハブへのコマンド投入ハンドル
    pub hub: ChatHub,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// 接続ごとの heartbeat 設定
    pub heartbeat: HeartbeatConfig,
    /// chat_id が指定されなかった場合の Room
    pub default_room_id: RoomId,
}
