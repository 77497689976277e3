//! MessagePusher trait 定義
//!
//! クライアントへの通知手段を抽象化します。
//! UseCase 層は「どの接続に何を届けるか」だけを決め、エンコードや
//! 実際の送信方法は Infrastructure 層に任せます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatMessage, ConnectionId, DisplayName, MessagePushError, RoomSnapshot};

/// 接続ごとの送信チャンネル（エンコード済みのテキストフレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// クライアントに届けるイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// 参加直後に送る Room の全状態
    RoomState(RoomSnapshot),
    /// presence の更新
    Presence(Vec<DisplayName>),
    /// チャットメッセージ（新規・既読更新のどちらも）
    Chat(ChatMessage),
    /// 送信者だけに返すエラー
    Error(String),
}

/// MessagePusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除（チャンネルが drop され writer が終了する）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信し、送信に失敗した接続を返す
    ///
    /// 一部の失敗で残りへの送信は中断しない。
    async fn broadcast(&self, targets: &[ConnectionId], event: &ServerEvent) -> Vec<ConnectionId>;
}
