//! Support chat console.
//!
//! Joins a room of the chat hub, prints the room's history, presence and
//! incoming messages, and sends typed lines as chat messages.
//! Reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chabudai-client -- --client-id u-1 --username guest --chat-id order-42
//! cargo run --bin chabudai-client -- -c u-2 -n admin -r order-42
//! ```

use chabudai_client::{ClientConfig, run_client};
use chabudai_server::config::DEFAULT_ROOM_ID;
use chabudai_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chabudai-client")]
#[command(about = "Support chat console for the Chabudai chat hub", long_about = None)]
struct Args {
    /// Client ID sent to the server
    #[arg(short = 'c', long)]
    client_id: String,

    /// Display name (defaults to the client ID)
    #[arg(short = 'n', long)]
    username: Option<String>,

    /// Room to join
    #[arg(short = 'r', long, default_value = DEFAULT_ROOM_ID)]
    chat_id: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            url: args.url,
            client_id: args.client_id,
            username: args.username,
            chat_id: args.chat_id,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = run_client(ClientConfig::from(args)).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
