//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 既読判定、履歴への追加、送信者を含む全参加者へのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 送信者も自分のメッセージを受け取ることを保証する（送信確認を兼ねる）
//! - 配信に失敗した接続が退出させられ、presence が更新されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人以上の Room への送信（read = true）
//! - エッジケース：存在しない Room への送信（破棄）
//! - 異常系：配信に失敗する接続が混ざっている

use std::sync::Arc;

use chabudai_shared::time::Clock;

use crate::domain::{
    ChatMessage, MessageDraft, MessagePusher, RoomRepository, ServerEvent, Timestamp,
};

use super::NotifyPresenceUseCase;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// presence 通知
    notify_presence: Arc<NotifyPresenceUseCase>,
    /// タイムスタンプ採番に使う時刻
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
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

    /// メッセージ送信を実行
    ///
    /// 1. Room の履歴に追加（timestamp の採番と既読判定を含む）
    /// 2. 送信者を含む全参加者にブロードキャスト
    /// 3. 配信に失敗した接続を退出させる
    /// 4. presence を通知
    ///
    /// # Returns
    ///
    /// * `Some(ChatMessage)` - 確定したメッセージ
    /// * `None` - Room が存在しないため破棄した
    pub async fn execute(&self, draft: MessageDraft) -> Option<ChatMessage> {
        let room_id = draft.room_id.clone();
        let now = Timestamp::new(self.clock.now_millis());

        let Some(delivery) = self.repository.publish(draft, now).await else {
            tracing::debug!("Room '{}' does not exist, message dropped", room_id);
            return None;
        };
        tracing::info!(
            "Message from '{}' in room '{}' at {} (read: {}, {} recipients)",
            delivery.message.sender,
            room_id,
            delivery.message.timestamp,
            delivery.message.read,
            delivery.targets.len()
        );

        let failed = self
            .message_pusher
            .broadcast(&delivery.targets, &ServerEvent::Chat(delivery.message.clone()))
            .await;
        if !failed.is_empty() {
            self.notify_presence.evict(&room_id, &failed).await;
        }

        self.notify_presence.execute(&room_id).await;

        Some(delivery.message)
    }
}
