//! Message formatting utilities for client display.

use chabudai_server::infrastructure::dto::websocket::{ChatMessageDto, RoomStateMessage};
use chabudai_shared::time::timestamp_to_clock_label;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the snapshot received right after joining
    ///
    /// # Arguments
    ///
    /// * `state` - Message history and online users of the room
    /// * `chat_id` - The joined room
    /// * `me` - The current client's display name (to mark as "me")
    pub fn format_room_state(state: &RoomStateMessage, chat_id: &str, me: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("Room: {}\n", chat_id));
        output.push_str(&format!("Online: {}\n", Self::online_list(&state.online_users, me)));

        if state.messages.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            output.push_str(&format!("History ({} messages):\n", state.messages.len()));
            for message in &state.messages {
                output.push_str(&Self::format_history_line(message));
            }
        }

        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format a presence update
    pub fn format_presence(online_users: &[String], me: &str) -> String {
        format!("\n* online: {}\n", Self::online_list(online_users, me))
    }

    /// Format a chat message, either new or a read-status echo
    pub fn format_chat_message(message: &ChatMessageDto) -> String {
        format!(
            "\n\n{}\n@{}: {}\n{} {} (ts {})\n{}\n",
            THIN_RULE,
            message.sender,
            message.text,
            timestamp_to_clock_label(message.timestamp),
            Self::read_tick(message.read),
            message.timestamp,
            THIN_RULE
        )
    }

    /// Format an error reported by the server
    pub fn format_error(error: &str) -> String {
        format!("\n! server error: {}\n", error)
    }

    /// Format an input error
    pub fn format_input_error(error: &str) -> String {
        format!("! {}\n", error)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn format_history_line(message: &ChatMessageDto) -> String {
        format!(
            "  [{}] @{}: {} {}\n",
            timestamp_to_clock_label(message.timestamp),
            message.sender,
            message.text,
            Self::read_tick(message.read)
        )
    }

    fn online_list(online_users: &[String], me: &str) -> String {
        if online_users.is_empty() {
            return "(nobody)".to_string();
        }
        online_users
            .iter()
            .map(|user| {
                if user == me {
                    format!("{} (me)", user)
                } else {
                    user.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn read_tick(read: bool) -> &'static str {
        if read { "✓✓" } else { "✓" }
    }
}
