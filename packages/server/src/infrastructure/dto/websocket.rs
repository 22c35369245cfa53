//! Presence Channel wire frames (JSON text frames tagged by `type`).

use serde::{Deserialize, Serialize};

/// Client → Server frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    /// `{type:"online", userId}`, sent immediately after the connection opens
    Online { user_id: i64 },

    /// `{type:"message", senderId, targetId, content, clientMessageId?}`
    Message {
        sender_id: i64,
        target_id: i64,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_message_id: Option<String>,
    },
}

/// Server → Client frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerFrame {
    /// `{type:"message", message:{...}}`
    Message { message: MessageDto },

    /// `{type:"onlineUsers", users:[{id, username}]}`: full snapshot, never a diff
    OnlineUsers { users: Vec<OnlineUserDto> },

    /// `{type:"error", code, message, clientMessageId?}`
    Error {
        code: ErrorCode,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_message_id: Option<String>,
    },
}

impl ServerFrame {
    pub fn error(code: ErrorCode, message: impl Into<String>, client_message_id: Option<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            client_message_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A message record, shared by live frames and History Service responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub sender_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    pub content: String,
    /// RFC 3339, UTC, millisecond precision
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUserDto {
    pub id: i64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Malformed send (empty content, sender == target, sender mismatch)
    Validation,
    /// Unknown user
    NotFound,
    /// The user already has a live connection; the server closes this one
    DuplicateSession,
    /// `message` sent before `online`
    NotAnnounced,
    /// Unparseable frame
    InvalidFrame,
    /// The server could not persist the message
    Internal,
}
