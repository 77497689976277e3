//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("display name must not be empty")]
    DisplayNameEmpty,
}

/// メッセージ送信（プッシュ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 対象の接続が登録されていない
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    /// 送信チャンネルが閉じている（writer タスクが終了済み）
    #[error("failed to push to connection '{0}': channel closed")]
    ChannelClosed(String),

    /// ペイロードのシリアライズに失敗
    #[error("failed to encode event: {0}")]
    Encode(String),
}
