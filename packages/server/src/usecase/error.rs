//! UseCase errors.

use thiserror::Error;

/// `online` アナウンスの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("user {0} does not exist")]
    UnknownUser(i64),

    #[error("user {0} is already online")]
    AlreadyOnline(i64),
}

/// メッセージ送信（Message Router）の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// 不正な送信内容（リトライしない）
    #[error("validation error: {0}")]
    Validation(String),

    /// 宛先ユーザーが存在しない（リトライしない）
    #[error("target user {0} not found")]
    TargetNotFound(i64),

    /// 永続化に失敗（送信全体が失敗）
    #[error("failed to persist message: {0}")]
    Persistence(String),
}

/// History Service の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("user {0} not found")]
    UserNotFound(i64),
}

/// 認証まわりの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("storage error: {0}")]
    Storage(String),
}
