//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 各メソッドは「読み取り → 判定 → 書き込み」を 1 回のロック内で完結させる単位で
//! 切られています。例えば `publish` は参加者数の読み取り・既読判定・履歴追加・
//! 配信先の確定をまとめて行い、呼び出し側で分割しないこと。

use async_trait::async_trait;

use super::{
    ChatMessage, ConnectionId, DisplayName, Member, MessageDraft, ReadStatusUpdate, Room, RoomId,
    RoomSnapshot, Timestamp,
};

/// 参加者削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// 既に参加者ではなかった（Room が存在しない場合も含む）
    NotMember,
    /// 削除した。最後の参加者だった場合は Room ごと削除されている
    Left { room_deleted: bool },
}

/// presence と配信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub online_users: Vec<DisplayName>,
    pub targets: Vec<ConnectionId>,
}

/// 確定したメッセージと配信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message: ChatMessage,
    pub targets: Vec<ConnectionId>,
}

/// 既読更新されたメッセージと配信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStatusDelivery {
    pub messages: Vec<ChatMessage>,
    pub targets: Vec<ConnectionId>,
}

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者を登録し、登録後の Room のスナップショットを返す
    ///
    /// Room が存在しなければ `now` を作成時刻として空の履歴で作成する。
    async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        member: Member,
        now: Timestamp,
    ) -> RoomSnapshot;

    /// 参加者を削除する。空になった Room は履歴ごと即座に削除する
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> LeaveOutcome;

    /// 現在の presence を取得（Room が存在しなければ `None`）
    async fn presence(&self, room_id: &RoomId) -> Option<Presence>;

    /// メッセージを確定させ履歴に追加する（Room が存在しなければ `None`）
    async fn publish(&self, draft: MessageDraft, now: Timestamp) -> Option<Delivery>;

    /// 既読状態を更新する（Room が存在しなければ `None`）
    async fn apply_read_status(&self, update: ReadStatusUpdate) -> Option<ReadStatusDelivery>;

    /// Room を取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全ての Room を取得（ID 順）
    async fn get_rooms(&self) -> Vec<Room>;
}
