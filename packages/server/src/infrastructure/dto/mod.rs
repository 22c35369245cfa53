//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: Presence Channel frames
//! - `http`: HTTP API request/response bodies
//!
//! Field names are camelCase on the wire.

pub mod conversion;
pub mod http;
pub mod websocket;
