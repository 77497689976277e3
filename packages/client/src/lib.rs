//! CLI chat console for the support chat hub.

pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use config::ClientConfig;
pub use runner::run_client;
