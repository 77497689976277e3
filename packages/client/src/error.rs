//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the WebSocket handshake
    #[error("Connection rejected by server with HTTP {0}")]
    Rejected(u16),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Server URL could not be parsed
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
