//! チャットハブ
//!
//! Room の状態を変更する操作（参加・退出・送信・既読更新）は全て 1 本の
//! コマンドキューを通り、単一の [`HubRunner`] タスクが到着順に処理します。
//! 同じ Room へのメッセージは全参加者に同じ順序で届き、参加直後の
//! スナップショットはその接続に届く他のどのイベントよりも先になります。
//!
//! ```text
//! reader task ─┐
//! reader task ─┼─> ChatHub (mpsc::UnboundedSender<HubCommand>)
//! reader task ─┘        │
//!                       v
//!                  HubRunner ──> UseCase ──> MessagePusher ──> writer tasks
//! ```

use std::sync::Arc;

use chabudai_shared::time::Clock;
use tokio::sync::mpsc;

use crate::domain::{
    ConnectionId, Member, MessageDraft, MessagePusher, PusherChannel, ReadStatusUpdate, RoomId,
    RoomRepository, ServerEvent,
};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, NotifyPresenceUseCase,
    SendMessageUseCase, UpdateReadStatusUseCase, error::HubError,
};

/// ハブが処理するコマンド
#[derive(Debug)]
pub enum HubCommand {
    /// 送信チャンネルを登録し、Room に参加する
    Join {
        room_id: RoomId,
        connection_id: ConnectionId,
        member: Member,
        channel: PusherChannel,
    },
    /// Room から退出する
    Leave {
        room_id: RoomId,
        connection_id: ConnectionId,
    },
    /// チャットメッセージを送信する
    Publish(MessageDraft),
    /// 既読状態を更新する
    UpdateReadStatus(ReadStatusUpdate),
    /// 接続本人にだけエラーを返す
    ReportError {
        connection_id: ConnectionId,
        message: String,
    },
}

/// ハブへのコマンド投入ハンドル（接続ごとに clone して使う）
#[derive(Debug, Clone)]
pub struct ChatHub {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl ChatHub {
    /// ハブのハンドルと、コマンドを処理する [`HubRunner`] を作成
    pub fn build(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> (Self, HubRunner) {
        let (tx, rx) = mpsc::unbounded_channel();

        let notify_presence = Arc::new(NotifyPresenceUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        ));
        let runner = HubRunner {
            commands: rx,
            message_pusher: message_pusher.clone(),
            connect_participant: ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                notify_presence.clone(),
                clock.clone(),
            ),
            disconnect_participant: DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                notify_presence.clone(),
            ),
            send_message: SendMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                notify_presence.clone(),
                clock,
            ),
            update_read_status: UpdateReadStatusUseCase::new(
                repository,
                message_pusher,
                notify_presence,
            ),
        };

        (Self { commands: tx }, runner)
    }

    pub fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        member: Member,
        channel: PusherChannel,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Join {
            room_id,
            connection_id,
            member,
            channel,
        })
    }

    pub fn leave(&self, room_id: RoomId, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(HubCommand::Leave {
            room_id,
            connection_id,
        })
    }

    pub fn publish(&self, draft: MessageDraft) -> Result<(), HubError> {
        self.send(HubCommand::Publish(draft))
    }

    pub fn update_read_status(&self, update: ReadStatusUpdate) -> Result<(), HubError> {
        self.send(HubCommand::UpdateReadStatus(update))
    }

    pub fn report_error(&self, connection_id: ConnectionId, message: String) -> Result<(), HubError> {
        self.send(HubCommand::ReportError {
            connection_id,
            message,
        })
    }

    fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_| HubError::Closed)
    }
}

/// コマンドキューの唯一の消費者
pub struct HubRunner {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    message_pusher: Arc<dyn MessagePusher>,
    connect_participant: ConnectParticipantUseCase,
    disconnect_participant: DisconnectParticipantUseCase,
    send_message: SendMessageUseCase,
    update_read_status: UpdateReadStatusUseCase,
}

impl HubRunner {
    /// 全ての [`ChatHub`] が drop されるまでコマンドを処理し続ける
    pub async fn run(mut self) {
        tracing::info!("Chat hub started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command).await;
        }
        tracing::info!("Chat hub stopped");
    }

    async fn handle(&self, command: HubCommand) {
        match command {
            HubCommand::Join {
                room_id,
                connection_id,
                member,
                channel,
            } => {
                self.message_pusher
                    .register_client(connection_id, channel)
                    .await;
                self.connect_participant
                    .execute(room_id, connection_id, member)
                    .await;
            }
            HubCommand::Leave {
                room_id,
                connection_id,
            } => {
                self.disconnect_participant
                    .execute(&room_id, &connection_id)
                    .await;
            }
            HubCommand::Publish(draft) => {
                self.send_message.execute(draft).await;
            }
            HubCommand::UpdateReadStatus(update) => {
                self.update_read_status.execute(update).await;
            }
            HubCommand::ReportError {
                connection_id,
                message,
            } => {
                if let Err(e) = self
                    .message_pusher
                    .push_to(&connection_id, &ServerEvent::Error(message))
                    .await
                {
                    tracing::warn!("Failed to report error to '{}': {}", connection_id, e);
                }
            }
        }
    }
}
