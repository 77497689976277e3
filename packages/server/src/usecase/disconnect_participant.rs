//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 参加者の削除、空になった Room の削除、残りの参加者への presence 通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と presence 通知
//! - エッジケース：最後の参加者の切断（Room と履歴の削除）
//! - エッジケース：既に退出させられた接続の切断（冪等）

use std::sync::Arc;

use crate::domain::{ConnectionId, LeaveOutcome, MessagePusher, RoomId, RoomRepository};

use super::NotifyPresenceUseCase;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// presence 通知
    notify_presence: Arc<NotifyPresenceUseCase>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// Room からの削除結果。`Left { room_deleted: false }` の場合のみ presence を通知する
    pub async fn execute(&self, room_id: &RoomId, connection_id: &ConnectionId) -> LeaveOutcome {
        self.message_pusher.unregister_client(connection_id).await;
        let outcome = self.repository.leave(room_id, connection_id).await;

        match outcome {
            LeaveOutcome::Left { room_deleted: false } => {
                tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
                self.notify_presence.execute(room_id).await;
            }
            LeaveOutcome::Left { room_deleted: true } => {
                tracing::info!(
                    "Connection '{}' left room '{}' as the last member",
                    connection_id,
                    room_id
                );
            }
            LeaveOutcome::NotMember => {
                tracing::debug!(
                    "Connection '{}' was already removed from room '{}'",
                    connection_id,
                    room_id
                );
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DisplayName, Member, MockMessagePusher, MockRoomRepository, Timestamp},
        infrastructure::{
            dto::websocket::ServerFrame, message_pusher::WebSocketMessagePusher,
            repository::InMemoryRoomRepository,
        },
    };
    use tokio::sync::mpsc;

    fn room_id() -> RoomId {
        RoomId::new("order-1".to_string()).unwrap()
    }

    async fn join(
        repository: &InMemoryRoomRepository,
        pusher: &WebSocketMessagePusher,
        name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::generate();
        pusher.register_client(id, tx).await;
        repository
            .join(
                room_id(),
                id,
                Member::new(
                    name.to_string(),
                    DisplayName::new(name.to_string()).unwrap(),
                    Timestamp::new(1),
                ),
                Timestamp::new(1),
            )
            .await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_members() {
        // テスト項目: 切断後、残りの参加者に更新された presence が届く
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let notify = Arc::new(NotifyPresenceUseCase::new(repository.clone(), pusher.clone()));
        let usecase = DisconnectParticipantUseCase::new(repository.clone(), pusher.clone(), notify);
        let (guest, _rx_guest) = join(&repository, &pusher, "guest").await;
        let (_, mut rx_admin) = join(&repository, &pusher, "admin").await;

        // when (操作):
        let outcome = usecase.execute(&room_id(), &guest).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::Left { room_deleted: false });
        let frame = ServerFrame::parse(&rx_admin.recv().await.unwrap()).unwrap();
        assert!(matches!(frame, ServerFrame::Status(ref s) if s.online_users == vec!["admin"]));
    }

    #[tokio::test]
    async fn test_disconnect_last_member_deletes_room() {
        // テスト項目: 最後の参加者が切断すると Room が削除され、presence は送られない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let notify = Arc::new(NotifyPresenceUseCase::new(repository.clone(), pusher.clone()));
        let usecase = DisconnectParticipantUseCase::new(repository.clone(), pusher.clone(), notify);
        let (guest, mut rx_guest) = join(&repository, &pusher, "guest").await;

        // when (操作):
        let outcome = usecase.execute(&room_id(), &guest).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::Left { room_deleted: true });
        assert!(repository.get_room(&room_id()).await.is_none());
        // 送信チャンネルは登録解除で閉じている
        assert_eq!(rx_guest.recv().await, None);
    }

    #[tokio::test]
    async fn test_disconnect_already_evicted_connection_skips_presence() {
        // テスト項目: 既に退出させられた接続の切断では presence を送らない
        // given (前提条件):
        let mut repository = MockRoomRepository::new();
        repository
            .expect_leave()
            .times(1)
            .returning(|_, _| LeaveOutcome::NotMember);
        repository.expect_presence().never();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_unregister_client().times(1).returning(|_| ());
        pusher.expect_broadcast().never();

        let repository: Arc<dyn RoomRepository> = Arc::new(repository);
        let pusher: Arc<dyn MessagePusher> = Arc::new(pusher);
        let notify = Arc::new(NotifyPresenceUseCase::new(repository.clone(), pusher.clone()));
        let usecase = DisconnectParticipantUseCase::new(repository, pusher, notify);

        // when (操作):
        let outcome = usecase.execute(&room_id(), &ConnectionId::generate()).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::NotMember);
    }
}
