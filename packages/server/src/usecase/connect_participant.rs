//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 参加者の登録、新規参加者へのスナップショット送信、presence 通知
//!
//! ### なぜこのテストが必要か
//! - 途中参加者が履歴と presence を 1 フレームで復元できることを保証する
//! - スナップショットが presence より先に届くことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：既存の履歴がある Room への参加
//! - エッジケース：スナップショット送信前に接続が死んでいる

use std::sync::Arc;

use chabudai_shared::time::Clock;

use crate::domain::{
    ConnectionId, Member, MessagePusher, RoomId, RoomRepository, ServerEvent, Timestamp,
};

use super::NotifyPresenceUseCase;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// presence 通知
    notify_presence: Arc<NotifyPresenceUseCase>,
    /// 時刻（Room の作成時刻に使う）
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        notify_presence: Arc<NotifyPresenceUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            notify_presence,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// 1. Room に登録（なければ作成）
    /// 2. 登録後のスナップショット（履歴 + 自分を含む presence）を本人に送信
    /// 3. Room 全体に presence を通知
    ///
    /// 送信チャンネルは呼び出し前に MessagePusher に登録済みであること。
    pub async fn execute(&self, room_id: RoomId, connection_id: ConnectionId, member: Member) {
        let now = Timestamp::new(self.clock.now_millis());
        let client_id = member.client_id.clone();
        let snapshot = self
            .repository
            .join(room_id.clone(), connection_id, member, now)
            .await;
        tracing::info!(
            "Client '{}' joined room '{}' as connection '{}' ({} messages in history)",
            client_id,
            room_id,
            connection_id,
            snapshot.messages.len()
        );

        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &ServerEvent::RoomState(snapshot))
            .await
        {
            tracing::warn!("Failed to send room state to '{}': {}", client_id, e);
            self.notify_presence.evict(&room_id, &[connection_id]).await;
        }

        self.notify_presence.execute(&room_id).await;
    }
}
