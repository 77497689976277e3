//! Multi-room support chat hub over WebSocket.
//!
//! Clients join a room with `GET /ws?client_id=…&username=…&chat_id=…`, receive
//! the room's history and presence, and every message sent to the room is
//! delivered to all of its members.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
