//! エンティティ
//!
//! - `Room`: 参加者（接続）とメッセージ履歴を持つチャットルーム
//! - `ChatMessage`: 履歴に積まれるチャットメッセージ
//! - `Member`: Room に登録された接続の情報
//!
//! Room はハブが排他的に所有します。接続そのもの（ソケット）は保持せず、
//! `ConnectionId` で参照するだけです。

use std::collections::HashMap;

use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

/// Room に登録された接続の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// 接続時に指定された client_id（ログ用）
    pub client_id: String,
    /// 表示名（presence とメッセージの sender に使われる）
    pub display_name: DisplayName,
    /// 接続時刻
    pub connected_at: Timestamp,
}

impl Member {
    pub fn new(client_id: String, display_name: DisplayName, connected_at: Timestamp) -> Self {
        Self {
            client_id,
            display_name,
            connected_at,
        }
    }
}

/// 履歴に追加されたチャットメッセージ
///
/// `(room_id, timestamp)` が既読更新時の外部 ID として使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender: DisplayName,
    pub text: String,
    pub timestamp: Timestamp,
    pub read: bool,
}

/// publish 前のメッセージ（timestamp / read はまだ確定していない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub room_id: RoomId,
    /// サーバー側で登録済みの表示名（クライアントの申告値は使わない）
    pub sender: DisplayName,
    pub text: String,
    /// `Timestamp::UNSET` の場合はサーバーが採番する
    pub timestamp: Timestamp,
}

/// 既読状態の更新指示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStatusUpdate {
    pub room_id: RoomId,
    pub timestamp: Timestamp,
    pub read: bool,
}

/// 新規参加者に送る Room の全状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomSnapshot {
    pub messages: Vec<ChatMessage>,
    pub online_users: Vec<DisplayName>,
}

/// チャットルーム
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    members: HashMap<ConnectionId, Member>,
    history: Vec<ChatMessage>,
    /// 直近にサーバーが採番したタイムスタンプ
    last_assigned: Timestamp,
}

impl Room {
    /// 空の Room を作成
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            members: HashMap::new(),
            history: Vec::new(),
            last_assigned: Timestamp::UNSET,
        }
    }

    /// 接続を参加者として登録する（同じ ConnectionId は上書き）
    pub fn add_member(&mut self, connection_id: ConnectionId, member: Member) {
        self.members.insert(connection_id, member);
    }

    /// 接続を参加者から外す
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> Option<Member> {
        self.members.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains_key(connection_id)
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&Member> {
        self.members.get(connection_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 現在の参加者の ConnectionId 一覧
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.keys().copied().collect()
    }

    /// 現在の参加者の表示名一覧（表示名でソート）
    pub fn online_users(&self) -> Vec<DisplayName> {
        let mut users: Vec<DisplayName> = self
            .members
            .values()
            .map(|m| m.display_name.clone())
            .collect();
        users.sort();
        users
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// 新規参加者向けのスナップショット（履歴 + presence）
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            messages: self.history.clone(),
            online_users: self.online_users(),
        }
    }

    /// メッセージを確定させて履歴に追加する
    ///
    /// - timestamp 未指定なら `now` で採番する。採番値はこの Room 内で単調増加
    /// - 参加者が 2 人以上いれば `read = true`
    pub fn publish(&mut self, draft: MessageDraft, now: Timestamp) -> ChatMessage {
        let timestamp = if draft.timestamp.is_unset() {
            self.assign_timestamp(now)
        } else {
            draft.timestamp
        };

        let message = ChatMessage {
            room_id: self.id.clone(),
            sender: draft.sender,
            text: draft.text,
            timestamp,
            read: self.member_count() >= 2,
        };
        self.history.push(message.clone());
        message
    }

    /// timestamp が一致する全ての履歴の既読フラグを上書きし、更新後のメッセージを返す
    pub fn apply_read_status(&mut self, timestamp: Timestamp, read: bool) -> Vec<ChatMessage> {
        self.history
            .iter_mut()
            .filter(|m| m.timestamp == timestamp)
            .map(|m| {
                m.read = read;
                m.clone()
            })
            .collect()
    }

    fn assign_timestamp(&mut self, now: Timestamp) -> Timestamp {
        let next = if now > self.last_assigned {
            now
        } else {
            Timestamp::new(self.last_assigned.value() + 1)
        };
        self.last_assigned = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(RoomId::new("order-42".to_string()).unwrap(), Timestamp::new(1000))
    }

    fn member(name: &str) -> Member {
        Member::new(
            name.to_string(),
            DisplayName::new(name.to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn draft(room: &Room, sender: &str, text: &str, timestamp: i64) -> MessageDraft {
        MessageDraft {
            room_id: room.id.clone(),
            sender: DisplayName::new(sender.to_string()).unwrap(),
            text: text.to_string(),
            timestamp: Timestamp::new(timestamp),
        }
    }

    #[test]
    fn test_online_users_are_sorted_and_allow_duplicates() {
        // テスト項目: presence は表示名でソートされ、同名の参加者も別々に数えられる
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        room.add_member(ConnectionId::generate(), member("admin"));
        room.add_member(ConnectionId::generate(), member("guest"));

        // when (操作):
        let users = room.online_users();

        // then (期待する結果):
        let names: Vec<&str> = users.iter().map(|u| u.as_str()).collect();
        assert_eq!(names, vec!["admin", "guest", "guest"]);
    }

    #[test]
    fn test_publish_with_single_member_is_unread() {
        // テスト項目: 参加者が 1 人のときのメッセージは未読になる
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));

        // when (操作):
        let message = room.publish(draft(&room, "guest", "hello", 0), Timestamp::new(5000));

        // then (期待する結果):
        assert!(!message.read);
        assert_eq!(message.timestamp, Timestamp::new(5000));
        assert_eq!(room.history().len(), 1);
    }

    #[test]
    fn test_publish_with_two_members_is_read() {
        // テスト項目: 参加者が 2 人以上のときのメッセージは既読になる
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        room.add_member(ConnectionId::generate(), member("admin"));

        // when (操作):
        let message = room.publish(draft(&room, "guest", "hello", 0), Timestamp::new(5000));

        // then (期待する結果):
        assert!(message.read);
    }

    #[test]
    fn test_publish_keeps_client_supplied_timestamp() {
        // テスト項目: クライアントが指定した timestamp はそのまま使われる
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));

        // when (操作):
        let message = room.publish(draft(&room, "guest", "hi", 1234), Timestamp::new(5000));

        // then (期待する結果):
        assert_eq!(message.timestamp, Timestamp::new(1234));
    }

    #[test]
    fn test_auto_timestamps_never_collide_within_same_millisecond() {
        // テスト項目: 同一ミリ秒内に採番された timestamp は重複しない
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        let now = Timestamp::new(5000);

        // when (操作):
        let first = room.publish(draft(&room, "guest", "one", 0), now);
        let second = room.publish(draft(&room, "guest", "two", 0), now);
        let third = room.publish(draft(&room, "guest", "three", 0), Timestamp::new(4000));

        // then (期待する結果):
        assert_eq!(first.timestamp, Timestamp::new(5000));
        assert_eq!(second.timestamp, Timestamp::new(5001));
        assert_eq!(third.timestamp, Timestamp::new(5002));
    }

    #[test]
    fn test_apply_read_status_updates_all_matches() {
        // テスト項目: timestamp が一致する全てのメッセージの既読フラグが更新される
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        room.publish(draft(&room, "guest", "a", 77), Timestamp::new(5000));
        room.publish(draft(&room, "guest", "b", 77), Timestamp::new(5000));
        room.publish(draft(&room, "guest", "c", 0), Timestamp::new(5000));

        // when (操作):
        let updated = room.apply_read_status(Timestamp::new(77), true);

        // then (期待する結果):
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|m| m.read));
        assert!(!room.history()[2].read);
    }

    #[test]
    fn test_apply_read_status_without_match_is_noop() {
        // テスト項目: 一致するメッセージがなければ何も更新されない
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        room.publish(draft(&room, "guest", "a", 10), Timestamp::new(5000));

        // when (操作):
        let updated = room.apply_read_status(Timestamp::new(99), true);

        // then (期待する結果):
        assert!(updated.is_empty());
        assert!(!room.history()[0].read);
    }

    #[test]
    fn test_snapshot_contains_history_in_order() {
        // テスト項目: スナップショットには履歴が送信順に含まれる
        // given (前提条件):
        let mut room = room();
        room.add_member(ConnectionId::generate(), member("guest"));
        for text in ["first", "second", "third"] {
            room.publish(draft(&room, "guest", text, 0), Timestamp::new(5000));
        }

        // when (操作):
        let snapshot = room.snapshot();

        // then (期待する結果):
        let texts: Vec<&str> = snapshot.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(snapshot.online_users.len(), 1);
    }
}
