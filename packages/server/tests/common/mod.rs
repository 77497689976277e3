//! Helpers shared by the integration tests.
//!
//! The real router is served in-process on an ephemeral port and driven with
//! `tokio-tungstenite` / `reqwest`.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use chabudai_server::{
    config::ServerConfig,
    infrastructure::{
        dto::websocket::{ChatMessageDto, ServerFrame},
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
    ui::Server,
    usecase::{ChatHub, GetRoomDetailUseCase, GetRoomsUseCase},
};
use chabudai_shared::time::SystemClock;
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage the server task lifecycle
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let repository = Arc::new(InMemoryRoomRepository::default());
        let message_pusher = Arc::new(WebSocketMessagePusher::default());
        let (hub, hub_runner) =
            ChatHub::build(repository.clone(), message_pusher, Arc::new(SystemClock));
        let server = Server::new(
            hub,
            hub_runner,
            Arc::new(GetRoomsUseCase::new(repository.clone())),
            Arc::new(GetRoomDetailUseCase::new(repository)),
            config,
        )
        .unwrap();

        let handle = tokio::spawn(async move {
            server.serve(listener).await.unwrap();
        });

        TestServer { addr, handle }
    }

    pub fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/ws?{}", self.addr, query)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A WebSocket client speaking the chat protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(server: &TestServer, client_id: &str, username: &str, chat_id: &str) -> Self {
        let url = server.ws_url(&format!(
            "client_id={client_id}&username={username}&chat_id={chat_id}"
        ));
        let (stream, _) = connect_async(url).await.unwrap();
        TestClient { stream }
    }

    pub fn from_stream(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        TestClient { stream }
    }

    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.stream
            .send(Message::Text(value.to_string().into()))
            .await
            .unwrap();
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .unwrap();
    }

    /// Next text frame, decoded. Control frames are skipped.
    pub async fn next_frame(&mut self) -> ServerFrame {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream ended")
                .unwrap();
            if let Message::Text(text) = message {
                return ServerFrame::parse(text.as_str()).unwrap();
            }
        }
    }

    /// Next chat message, skipping presence updates
    pub async fn next_chat(&mut self) -> ChatMessageDto {
        loop {
            match self.next_frame().await {
                ServerFrame::Chat(chat) => return chat,
                ServerFrame::Status(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Read until a presence update with exactly `users` arrives
    pub async fn wait_for_presence(&mut self, users: &[&str]) {
        loop {
            if let ServerFrame::Status(status) = self.next_frame().await
                && status.online_users == users
            {
                return;
            }
        }
    }

    pub async fn close(mut self) {
        self.stream.close(None).await.unwrap();
    }
}
