//! UseCase: presence 通知
//!
//! Room の参加者一覧を全参加者に配信します。配信に失敗した接続は退出させ、
//! 縮んだ Room に対して失敗がなくなるまで再通知します（参加者数で上限あり）。

use std::sync::Arc;

use crate::domain::{ConnectionId, LeaveOutcome, MessagePusher, RoomId, RoomRepository, ServerEvent};

/// presence 通知のユースケース
pub struct NotifyPresenceUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl NotifyPresenceUseCase {
    /// 新しい NotifyPresenceUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// presence 通知を実行
    ///
    /// Room が存在しない（既に削除された）場合は何もしない。
    pub async fn execute(&self, room_id: &RoomId) {
        while let Some(presence) = self.repository.presence(room_id).await {
            let failed = self
                .message_pusher
                .broadcast(&presence.targets, &ServerEvent::Presence(presence.online_users))
                .await;
            if failed.is_empty() {
                return;
            }
            self.evict(room_id, &failed).await;
        }
    }

    /// 配信に失敗した接続を Room と MessagePusher から外す
    ///
    /// # Returns
    ///
    /// 実際に Room から外した接続の数
    pub async fn evict(&self, room_id: &RoomId, failed: &[ConnectionId]) -> usize {
        let mut evicted = 0;
        for connection_id in failed {
            self.message_pusher.unregister_client(connection_id).await;
            if let LeaveOutcome::Left { room_deleted } =
                self.repository.leave(room_id, connection_id).await
            {
                evicted += 1;
                tracing::warn!(
                    "Connection '{}' evicted from room '{}' after a failed push (room deleted: {})",
                    connection_id,
                    room_id,
                    room_deleted
                );
            }
        }
        evicted
    }
}
