//! Conversion logic between DTOs and domain entities.

use pairline_shared::time::{rfc3339_to_timestamp, timestamp_to_rfc3339};
use thiserror::Error;

use crate::domain::{
    ClientMessageId, DirectMessage, MessageContent, PresenceSnapshot, Timestamp, User, UserId,
    Username, ValueObjectError,
};
use crate::infrastructure::dto::{
    http::UserDto,
    websocket::{MessageDto, OnlineUserDto, ServerFrame},
};

/// DTO → ドメインモデル変換のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtoConversionError {
    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),

    #[error("message has no targetId")]
    MissingTarget,

    #[error("invalid createdAt '{0}'")]
    InvalidTimestamp(String),
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<MessageDto> for DirectMessage {
    type Error = DtoConversionError;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        let target_id = dto.target_id.ok_or(DtoConversionError::MissingTarget)?;
        let created_at = rfc3339_to_timestamp(&dto.created_at)
            .ok_or_else(|| DtoConversionError::InvalidTimestamp(dto.created_at.clone()))?;
        let client_message_id = dto.client_message_id.map(ClientMessageId::new).transpose()?;

        Ok(DirectMessage::new(
            UserId::new(dto.sender_id)?,
            UserId::new(target_id)?,
            MessageContent::new(dto.content)?,
            Timestamp::new(created_at),
            client_message_id,
        ))
    }
}

/// 受信側から見た `message` フレームをドメインモデルにする
///
/// `targetId` が省略されていれば、このフレームを受け取った `recipient` 宛てとみなす。
/// 自分が送ったメッセージ（エコー）は宛先を推定できないので `MissingTarget`。
pub fn message_for_recipient(
    mut dto: MessageDto,
    recipient: UserId,
) -> Result<DirectMessage, DtoConversionError> {
    if dto.target_id.is_none() && dto.sender_id != recipient.value() {
        dto.target_id = Some(recipient.value());
    }
    DirectMessage::try_from(dto)
}

impl TryFrom<OnlineUserDto> for User {
    type Error = DtoConversionError;

    fn try_from(dto: OnlineUserDto) -> Result<Self, Self::Error> {
        Ok(User::new(UserId::new(dto.id)?, Username::new(dto.username)?))
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&DirectMessage> for MessageDto {
    fn from(model: &DirectMessage) -> Self {
        Self {
            sender_id: model.sender_id.value(),
            target_id: Some(model.target_id.value()),
            content: model.content.as_str().to_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
            client_message_id: model
                .client_message_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
        }
    }
}

impl From<&User> for OnlineUserDto {
    fn from(model: &User) -> Self {
        Self {
            id: model.id.value(),
            username: model.username.as_str().to_string(),
        }
    }
}

impl From<&PresenceSnapshot> for ServerFrame {
    fn from(snapshot: &PresenceSnapshot) -> Self {
        ServerFrame::OnlineUsers {
            users: snapshot.users.iter().map(OnlineUserDto::from).collect(),
        }
    }
}

impl From<&DirectMessage> for ServerFrame {
    fn from(message: &DirectMessage) -> Self {
        ServerFrame::Message {
            message: MessageDto::from(message),
        }
    }
}

/// `onlineUsers` フレームを JSON にする（UseCase に注入する `FrameEncoder`）
pub fn encode_presence_snapshot(snapshot: &PresenceSnapshot) -> String {
    encode_frame(&ServerFrame::from(snapshot))
}

/// `message` フレームを JSON にする（UseCase に注入する `FrameEncoder`）
pub fn encode_direct_message(message: &DirectMessage) -> String {
    encode_frame(&ServerFrame::from(message))
}

fn encode_frame(frame: &ServerFrame) -> String {
    frame.to_json().unwrap_or_else(|e| {
        tracing::error!("Failed to encode server frame: {}", e);
        String::new()
    })
}

/// ユーザーとオンライン状態から `UserDto` を作る
pub fn user_to_dto(user: &User, is_online: bool) -> UserDto {
    UserDto {
        id: user.id.value(),
        username: user.username.as_str().to_string(),
        is_online,
    }
}
