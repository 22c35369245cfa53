//! Reconnect policy for the Presence Channel.
//!
//! Pure functions, no I/O, so the policy can be tested without a server.

use std::time::Duration;

use crate::error::ClientError;

/// Which kind of connection attempt is being retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    /// The first connect of a session
    Initial,
    /// Connecting again after this session's channel was lost
    ///
    /// The server may still hold the lost connection until it notices the
    /// drop, so `DuplicateSession` is retried here.
    Reconnect,
}

/// Capped exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnection attempt `attempt` (0-indexed): `base * 2^attempt`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Check if the client should attempt to reconnect.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that ended (or prevented) the connection
    /// * `current_attempt` - The reconnection attempt count so far (0-indexed)
    /// * `phase` - Whether the session was connected before
    pub fn should_attempt_reconnect(
        &self,
        error: &ClientError,
        current_attempt: u32,
        phase: ConnectPhase,
    ) -> bool {
        let retryable = match (phase, error) {
            (ConnectPhase::Reconnect, ClientError::DuplicateSession(_)) => true,
            _ => !should_exit_immediately(error),
        };
        retryable && current_attempt < self.max_attempts
    }
}

/// Errors that no amount of retrying can fix
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::DuplicateSession(_) | ClientError::NotFound(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_with_duplicate_session() {
        // テスト項目: DuplicateSession エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::DuplicateSession(1);

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_not_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("connection refused".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 最大試行回数未満なら再接続を試みる
        // given (前提条件):
        let policy = ReconnectPolicy::default();
        let error = ClientError::ConnectionError("connection lost".to_string());

        // when (操作) / then (期待する結果):
        assert!(policy.should_attempt_reconnect(&error, 0, ConnectPhase::Initial));
        assert!(policy.should_attempt_reconnect(&error, 4, ConnectPhase::Reconnect));
        assert!(!policy.should_attempt_reconnect(&error, 5, ConnectPhase::Reconnect));
    }

    #[test]
    fn test_should_not_retry_duplicate_session_on_first_connect() {
        // テスト項目: 最初の接続での DuplicateSession は再試行しない（他の端末が接続中）
        // given (前提条件):
        let policy = ReconnectPolicy::default();
        let error = ClientError::DuplicateSession(7);

        // when (操作):
        let result = policy.should_attempt_reconnect(&error, 0, ConnectPhase::Initial);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_duplicate_session_is_retried_while_reconnecting() {
        // テスト項目: 再接続中の DuplicateSession はサーバーが古い接続を片付けるまで試行回数内で再試行する
        // given (前提条件):
        let policy = ReconnectPolicy::default();
        let error = ClientError::DuplicateSession(7);

        // when (操作) / then (期待する結果):
        assert!(policy.should_attempt_reconnect(&error, 0, ConnectPhase::Reconnect));
        assert!(policy.should_attempt_reconnect(&error, 4, ConnectPhase::Reconnect));
        assert!(!policy.should_attempt_reconnect(&error, 5, ConnectPhase::Reconnect));
    }

    #[test]
    fn test_not_found_is_never_retried() {
        // テスト項目: NotFound は再接続中でも再試行しない
        // given (前提条件):
        let policy = ReconnectPolicy::default();
        let error = ClientError::NotFound("user 7 does not exist".to_string());

        // when (操作) / then (期待する結果):
        assert!(!policy.should_attempt_reconnect(&error, 0, ConnectPhase::Initial));
        assert!(!policy.should_attempt_reconnect(&error, 0, ConnectPhase::Reconnect));
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        // テスト項目: 待ち時間は 500ms から倍々に増え、8 秒で頭打ちになる
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let delays: Vec<u128> = (0..7).map(|a| policy.delay_for(a).as_millis()).collect();

        // then (期待する結果):
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 8000, 8000]);
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(8));
    }
}
