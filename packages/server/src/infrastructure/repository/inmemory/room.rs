//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `HashMap<RoomId, Room>` をインメモリ DB として使用します。
//!
//! ## 排他制御
//!
//! Room テーブル全体を 1 つの `Mutex` で保護します。Room の操作は
//! マップ操作のみで I/O を伴わないため、粗い粒度のロックで十分です。
//! ロックを保持したままソケットへの書き込みは行いません（配信は
//! MessagePusher のチャンネル経由）。
//!
//! 水平スケールが必要になった場合は room_id のハッシュでシャーディングする。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Delivery, LeaveOutcome, Member, MessageDraft, Presence, ReadStatusDelivery,
    ReadStatusUpdate, Room, RoomId, RoomRepository, RoomSnapshot, Timestamp,
};

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    /// Room テーブル
    rooms: Arc<Mutex<HashMap<RoomId, Room>>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(rooms: Arc<Mutex<HashMap<RoomId, Room>>>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        member: Member,
        now: Timestamp,
    ) -> RoomSnapshot {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", room_id);
            Room::new(room_id.clone(), now)
        });
        room.add_member(connection_id, member);
        room.snapshot()
    }

    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> LeaveOutcome {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return LeaveOutcome::NotMember;
        };
        if room.remove_member(connection_id).is_none() {
            return LeaveOutcome::NotMember;
        }

        let room_deleted = room.is_empty();
        if room_deleted {
            rooms.remove(room_id);
            tracing::info!("Room '{}' is empty, deleted with its history", room_id);
        }
        LeaveOutcome::Left { room_deleted }
    }

    async fn presence(&self, room_id: &RoomId) -> Option<Presence> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|room| Presence {
            online_users: room.online_users(),
            targets: room.member_ids(),
        })
    }

    async fn publish(&self, draft: MessageDraft, now: Timestamp) -> Option<Delivery> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&draft.room_id)?;
        let message = room.publish(draft, now);
        Some(Delivery {
            message,
            targets: room.member_ids(),
        })
    }

    async fn apply_read_status(&self, update: ReadStatusUpdate) -> Option<ReadStatusDelivery> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&update.room_id)?;
        let messages = room.apply_read_status(update.timestamp, update.read);
        Some(ReadStatusDelivery {
            messages,
            targets: room.member_ids(),
        })
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    async fn get_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut all: Vec<Room> = rooms.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DisplayName;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Room の遅延作成と、最後の参加者が抜けたときの即時削除
    // - publish / apply_read_status が 1 回のロックで配信先まで確定すること
    //
    // 【なぜこのテストが必要か】
    // - Repository はハブの唯一の共有状態であり、Room のライフサイクルを決める
    //
    // 【どのようなシナリオをテストするか】
    // 1. join で Room が作成され、スナップショットに自分が含まれる
    // 2. 最後の参加者の leave で Room が履歴ごと削除される
    // 3. 存在しない Room への publish は None
    // 4. 既読更新と配信先
    // ========================================

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn member(name: &str) -> Member {
        Member::new(
            name.to_string(),
            DisplayName::new(name.to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn draft(room: &str, sender: &str, text: &str) -> MessageDraft {
        MessageDraft {
            room_id: room_id(room),
            sender: DisplayName::new(sender.to_string()).unwrap(),
            text: text.to_string(),
            timestamp: Timestamp::UNSET,
        }
    }

    #[tokio::test]
    async fn test_join_creates_room_lazily() {
        // テスト項目: 未知の Room への join で Room が作成される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = ConnectionId::generate();

        // when (操作):
        let snapshot = repo
            .join(room_id("order-1"), alice, member("alice"), Timestamp::new(1000))
            .await;

        // then (期待する結果):
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.online_users.len(), 1);
        let room = repo.get_room(&room_id("order-1")).await.unwrap();
        assert!(room.contains(&alice));
        assert_eq!(room.created_at, Timestamp::new(1000));
    }

    #[tokio::test]
    async fn test_leave_last_member_deletes_room_and_history() {
        // テスト項目: 最後の参加者が抜けると Room が履歴ごと削除される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = ConnectionId::generate();
        repo.join(room_id("order-1"), alice, member("alice"), Timestamp::new(1000))
            .await;
        repo.publish(draft("order-1", "alice", "hello"), Timestamp::new(2000))
            .await
            .unwrap();

        // when (操作):
        let outcome = repo.leave(&room_id("order-1"), &alice).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::Left { room_deleted: true });
        assert!(repo.get_room(&room_id("order-1")).await.is_none());

        let snapshot = repo
            .join(
                room_id("order-1"),
                ConnectionId::generate(),
                member("alice"),
                Timestamp::new(3000),
            )
            .await;
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_leave_keeps_room_with_remaining_members() {
        // テスト項目: 他の参加者が残っていれば Room は削除されない
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        repo.join(room_id("order-1"), alice, member("alice"), Timestamp::new(1000))
            .await;
        repo.join(room_id("order-1"), bob, member("bob"), Timestamp::new(1000))
            .await;

        // when (操作):
        let outcome = repo.leave(&room_id("order-1"), &alice).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::Left { room_deleted: false });
        let presence = repo.presence(&room_id("order-1")).await.unwrap();
        assert_eq!(presence.targets, vec![bob]);
    }

    #[tokio::test]
    async fn test_leave_unknown_connection_is_idempotent() {
        // テスト項目: 参加していない接続の leave はエラーにならない（冪等性）
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();

        // when (操作):
        let outcome = repo
            .leave(&room_id("missing"), &ConnectionId::generate())
            .await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::NotMember);
    }

    #[tokio::test]
    async fn test_publish_to_missing_room_returns_none() {
        // テスト項目: 存在しない Room への publish は破棄される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();

        // when (操作):
        let result = repo
            .publish(draft("ghost", "alice", "hello"), Timestamp::new(1000))
            .await;

        // then (期待する結果):
        assert!(result.is_none());
        assert!(repo.get_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_returns_all_members_as_targets() {
        // テスト項目: publish の配信先は送信者を含む全参加者
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        repo.join(room_id("order-1"), alice, member("alice"), Timestamp::new(1000))
            .await;
        repo.join(room_id("order-1"), bob, member("bob"), Timestamp::new(1000))
            .await;

        // when (操作):
        let delivery = repo
            .publish(draft("order-1", "alice", "hello"), Timestamp::new(2000))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivery.targets.len(), 2);
        assert!(delivery.targets.contains(&alice));
        assert!(delivery.targets.contains(&bob));
        assert!(delivery.message.read);
        assert_eq!(delivery.message.timestamp, Timestamp::new(2000));
    }

    #[tokio::test]
    async fn test_apply_read_status_updates_history() {
        // テスト項目: 既読更新が履歴に反映される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        let alice = ConnectionId::generate();
        repo.join(room_id("order-1"), alice, member("alice"), Timestamp::new(1000))
            .await;
        let delivery = repo
            .publish(draft("order-1", "alice", "hello"), Timestamp::new(2000))
            .await
            .unwrap();
        assert!(!delivery.message.read);

        // when (操作):
        let result = repo
            .apply_read_status(ReadStatusUpdate {
                room_id: room_id("order-1"),
                timestamp: Timestamp::new(2000),
                read: true,
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.targets, vec![alice]);
        let room = repo.get_room(&room_id("order-1")).await.unwrap();
        assert!(room.history()[0].read);
    }

    #[tokio::test]
    async fn test_get_rooms_sorted_by_id() {
        // テスト項目: Room 一覧は ID 順に返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::default();
        for id in ["order-3", "global", "order-1"] {
            repo.join(room_id(id), ConnectionId::generate(), member("a"), Timestamp::new(1))
                .await;
        }

        // when (操作):
        let rooms = repo.get_rooms().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["global", "order-1", "order-3"]);
    }
}
