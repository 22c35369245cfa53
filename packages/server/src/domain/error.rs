//! Domain error types.

use thiserror::Error;

/// 値オブジェクトの生成に失敗した理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must be positive (got {0})")]
    InvalidUserId(i64),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("username must be at most {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    #[error("username must not contain whitespace")]
    UsernameContainsWhitespace,

    #[error("message content must not be empty")]
    EmptyContent,

    #[error("message content must be at most {max} characters (got {actual})")]
    ContentTooLong { max: usize, actual: usize },

    #[error("client message id must be 1..={max} characters")]
    InvalidClientMessageId { max: usize },
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("user '{0}' is already online")]
    AlreadyOnline(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// MessagePusher 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not connected")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
