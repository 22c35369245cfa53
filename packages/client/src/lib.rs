//! Pairline CLI client.
//!
//! - `session_store`: the locally persisted identity
//! - `api`: HTTP API (authentication, user list, History Service)
//! - `presence_channel`: the live WebSocket connection
//! - `reconnect`: backoff policy for the Presence Channel
//! - `directory`: known users and their online state
//! - `conversation`: the Conversation View Model
//! - `runner`: the interactive event loop

pub mod api;
pub mod command;
pub mod conversation;
pub mod directory;
pub mod error;
pub mod formatter;
pub mod presence_channel;
pub mod reconnect;
pub mod runner;
pub mod session_store;
pub mod ui;

pub use error::ClientError;
