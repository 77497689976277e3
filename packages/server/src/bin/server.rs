//! Support chat hub server.
//!
//! Clients join a room over WebSocket and every message is delivered to all
//! members of that room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chabudai-server
//! cargo run --bin chabudai-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use chabudai_server::{
    config::{DEFAULT_ROOM_ID, HeartbeatConfig, ServerConfig},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::Server,
    usecase::{ChatHub, GetRoomDetailUseCase, GetRoomsUseCase},
};
use chabudai_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chabudai-server")]
#[command(about = "Multi-room support chat server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Room used when a client connects without chat_id
    #[arg(long, default_value = DEFAULT_ROOM_ID)]
    default_room: String,

    /// Seconds between two heartbeat pings
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_interval_secs: u64,

    /// Seconds to wait for a ping write and for its pong
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            default_room_id: args.default_room,
            heartbeat: HeartbeatConfig {
                interval: Duration::from_secs(args.heartbeat_interval_secs),
                timeout: Duration::from_secs(args.heartbeat_timeout_secs),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. Hub and UseCases
    // 4. Server

    // 1. Create Repository (in-memory database)
    let repository = Arc::new(InMemoryRoomRepository::default());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 3. Create Hub and UseCases
    let (hub, hub_runner) =
        ChatHub::build(repository.clone(), message_pusher, Arc::new(SystemClock));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository));

    // 4. Create and run the server
    let server = Server::new(
        hub,
        hub_runner,
        get_rooms_usecase,
        get_room_detail_usecase,
        config,
    )?;
    server.run().await?;

    Ok(())
}
