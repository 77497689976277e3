//! Server configuration.

use std::time::Duration;

/// Room used when a client connects without `chat_id`
pub const DEFAULT_ROOM_ID: &str = "global";

/// Liveness probe settings for each WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between two pings
    pub interval: Duration,
    /// Upper bound for writing a ping and for waiting on its pong
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub default_room_id: String,
    pub heartbeat: HeartbeatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_room_id: DEFAULT_ROOM_ID.to_string(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:8080`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
