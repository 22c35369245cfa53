//! Infrastructure 層
//!
//! - `dto`: ワイヤフォーマット（WebSocket / HTTP）と変換
//! - `repository`: Repository trait の実装
//! - `message_pusher`: MessagePusher trait の実装

pub mod dto;
pub mod message_pusher;
pub mod repository;
