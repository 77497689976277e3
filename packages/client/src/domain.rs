//! Domain logic for client-side operations.
//!
//! Pure functions without side effects: reconnect policy, input parsing and
//! encoding of outgoing frames.

use chabudai_server::infrastructure::dto::websocket::{ChatMessageDto, ReadStatusUpdateDto};
use thiserror::Error;

use crate::error::ClientError;

/// A line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Plain text sent as a chat message
    Chat(String),
    /// `/read <timestamp>` or `/unread <timestamp>`
    SetReadStatus { timestamp: i64, read: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("usage: /{0} <timestamp>")]
    MissingTimestamp(&'static str),

    #[error("'{0}' is not a timestamp")]
    InvalidTimestamp(String),

    #[error("unknown command '/{0}' (available: /read, /unread)")]
    UnknownCommand(String),
}

/// Check if the client should exit immediately based on the error type.
///
/// A handshake rejected with a 4xx status (missing or invalid query) and a
/// malformed URL cannot be fixed by retrying.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    match error {
        ClientError::Rejected(status) => (400..500).contains(status),
        ClientError::InvalidUrl(_) => true,
        ClientError::ConnectionError(_) => false,
    }
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Parse one input line. Empty lines are `None`.
pub fn parse_input(line: &str) -> Option<Result<ClientCommand, InputError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(Ok(ClientCommand::Chat(line.to_string())));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let read = match name {
        "read" => true,
        "unread" => false,
        other => return Some(Err(InputError::UnknownCommand(other.to_string()))),
    };
    let result = match parts.next() {
        None => Err(InputError::MissingTimestamp(if read { "read" } else { "unread" })),
        Some(raw) => raw
            .parse::<i64>()
            .map(|timestamp| ClientCommand::SetReadStatus { timestamp, read })
            .map_err(|_| InputError::InvalidTimestamp(raw.to_string())),
    };
    Some(result)
}

/// Encode a command as the JSON frame the server expects.
///
/// Chat messages carry timestamp 0 so that the server assigns one.
pub fn encode_command(
    command: &ClientCommand,
    chat_id: &str,
    sender: &str,
) -> Result<String, serde_json::Error> {
    match command {
        ClientCommand::Chat(text) => serde_json::to_string(&ChatMessageDto {
            chat_id: chat_id.to_string(),
            sender: sender.to_string(),
            text: text.clone(),
            timestamp: 0,
            read: false,
        }),
        ClientCommand::SetReadStatus { timestamp, read } => serde_json::to_string(
            &ReadStatusUpdateDto::new(chat_id.to_string(), *timestamp, *read),
        ),
    }
}
