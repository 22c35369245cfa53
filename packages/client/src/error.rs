//! Error types for the Pairline client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The user already has a live connection elsewhere
    #[error("User {0} is already online on another connection")]
    DuplicateSession(i64),

    /// Transport could not open or closed unexpectedly
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Malformed send or request (never retried)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown user (never retried)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A history response for a selection that is no longer current
    #[error("Stale history response for user {0}")]
    StaleResponse(i64),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Session store error: {0}")]
    SessionStore(String),
}
