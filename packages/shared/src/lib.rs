//! Utilities shared between the Chabudai chat server and client.

pub mod logger;
pub mod time;
