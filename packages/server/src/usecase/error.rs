//! UseCase 層のエラー型

use thiserror::Error;

/// Room 照会のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomQueryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("invalid room id: {0}")]
    InvalidRoomId(String),
}

/// ハブへのコマンド投入エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// ハブのタスクが停止している
    #[error("chat hub is not running")]
    Closed,
}
