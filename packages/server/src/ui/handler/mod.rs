//! Request handlers.

mod http;
mod websocket;

pub use http::{get_history, health_check, list_users, login, logout, register};
pub use websocket::websocket_handler;
