//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を ConnectionId で管理
//! - イベントの JSON エンコードと送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! ソケットへの書き込みは UI 層の writer タスクが行います。ここではチャンネルに
//! 積むだけなのでブロックしません。チャンネルへの送信失敗は writer タスクが
//! 終了済み（= 接続が死んでいる）ことを意味します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, ServerEvent},
    infrastructure::dto::conversion::encode_event,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信チャンネル
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let content = encode_event(event).map_err(|e| MessagePushError::Encode(e.to_string()))?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        sender
            .send(content)
            .map_err(|_| MessagePushError::ChannelClosed(connection_id.to_string()))?;
        tracing::debug!("Pushed event to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: &[ConnectionId], event: &ServerEvent) -> Vec<ConnectionId> {
        let content = match encode_event(event) {
            Ok(content) => content,
            Err(e) => {
                // エンコード失敗は接続の問題ではないので誰も退出させない
                tracing::error!("Failed to encode event for broadcast: {}", e);
                return Vec::new();
            }
        };

        let clients = self.clients.lock().await;
        let mut failed = Vec::new();

        for target in targets {
            match clients.get(target) {
                Some(sender) => {
                    if sender.send(content.clone()).is_err() {
                        tracing::warn!("Failed to push to connection '{}': channel closed", target);
                        failed.push(*target);
                    }
                }
                None => {
                    tracing::warn!("Connection '{}' not found during broadcast", target);
                    failed.push(*target);
                }
            }
        }

        failed
    }
}
