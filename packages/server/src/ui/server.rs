//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    domain::{RoomId, ValueObjectError},
    usecase::{ChatHub, GetRoomDetailUseCase, GetRoomsUseCase, HubRunner},
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let (hub, hub_runner) = ChatHub::build(repository.clone(), message_pusher, clock);
/// let server = Server::new(hub, hub_runner, get_rooms_usecase, get_room_detail_usecase, config)?;
/// server.run().await?;
/// ```
pub struct Server {
    /// ハブへのコマンド投入ハンドル
    hub: ChatHub,
    /// ハブのコマンド処理タスク（serve 時に spawn する）
    hub_runner: HubRunner,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    config: ServerConfig,
    default_room_id: RoomId,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Errors
    ///
    /// Returns an error if `config.default_room_id` is not a valid room id.
    pub fn new(
        hub: ChatHub,
        hub_runner: HubRunner,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
        config: ServerConfig,
    ) -> Result<Self, ValueObjectError> {
        let default_room_id = RoomId::new(config.default_room_id.clone())?;
        Ok(Self {
            hub,
            hub_runner,
            get_rooms_usecase,
            get_room_detail_usecase,
            config,
            default_room_id,
        })
    }

    /// Run the server on `config.host:config.port`
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the address or if
    /// there's an error during server execution.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let app_state = Arc::new(AppState {
            hub: self.hub,
            get_rooms_usecase: self.get_rooms_usecase,
            get_room_detail_usecase: self.get_room_detail_usecase,
            heartbeat: self.config.heartbeat,
            default_room_id: self.default_room_id,
        });

        let hub_task = tokio::spawn(self.hub_runner.run());

        let local_addr = listener.local_addr()?;
        tracing::info!("Support chat server listening on {}", local_addr);
        tracing::info!(
            "Connect to: ws://{}/ws?client_id=<id>&username=<name>&chat_id=<room>",
            local_addr
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, router(app_state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        hub_task.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
