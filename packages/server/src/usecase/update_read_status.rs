//! UseCase: 既読状態の更新
//!
//! 履歴中の timestamp が一致するメッセージの既読フラグを上書きし、
//! 更新後のメッセージを 1 件ずつ全参加者に再配信します。

use std::sync::Arc;

use crate::domain::{MessagePusher, ReadStatusUpdate, RoomRepository, ServerEvent};

use super::NotifyPresenceUseCase;

/// 既読状態更新のユースケース
pub struct UpdateReadStatusUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    notify_presence: Arc<NotifyPresenceUseCase>,
}

impl UpdateReadStatusUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        notify_presence: Arc<NotifyPresenceUseCase>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            notify_presence,
        }
    }

    /// 既読状態の更新を実行
    ///
    /// 配信に失敗した接続は以降のメッセージの配信先から外し、最後にまとめて
    /// 退出させる。退出させた接続があった場合のみ presence を通知する。
    ///
    /// # Returns
    ///
    /// 更新したメッセージの数（Room がない・一致がない場合は 0）
    pub async fn execute(&self, update: ReadStatusUpdate) -> usize {
        let room_id = update.room_id.clone();
        let timestamp = update.timestamp;

        let Some(delivery) = self.repository.apply_read_status(update).await else {
            tracing::debug!("Room '{}' does not exist, read update dropped", room_id);
            return 0;
        };
        if delivery.messages.is_empty() {
            tracing::debug!(
                "No message at {} in room '{}', read update ignored",
                timestamp,
                room_id
            );
            return 0;
        }

        let mut targets = delivery.targets;
        let mut failed_all = Vec::new();
        for message in &delivery.messages {
            let failed = self
                .message_pusher
                .broadcast(&targets, &ServerEvent::Chat(message.clone()))
                .await;
            targets.retain(|id| !failed.contains(id));
            failed_all.extend(failed);
        }
        tracing::info!(
            "Read status of {} message(s) at {} in room '{}' updated",
            delivery.messages.len(),
            timestamp,
            room_id
        );

        if !failed_all.is_empty() && self.notify_presence.evict(&room_id, &failed_all).await > 0 {
            self.notify_presence.execute(&room_id).await;
        }

        delivery.messages.len()
    }
}
