//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket の受付と `UnboundedSender` の生成は UI 層（`ui/handler/websocket.rs`）で行い、
//! この実装は登録された sender を使ってフレームを送るだけです。
//! 1 ユーザーにつき登録できる sender は 1 つです（マルチデバイスは扱わない）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, UserId};

#[derive(Debug, Default)]
pub struct WebSocketMessagePusher {
    /// Key: user_id, Value: 接続の送信チャンネル
    clients: Mutex<HashMap<UserId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みのクライアント数
    pub async fn connected_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, user_id: UserId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        if clients.insert(user_id, sender).is_some() {
            tracing::warn!("User {} re-registered to MessagePusher, previous channel replaced", user_id);
        } else {
            tracing::debug!("User {} registered to MessagePusher", user_id);
        }
    }

    async fn unregister_client(&self, user_id: &UserId) {
        let mut clients = self.clients.lock().await;
        clients.remove(user_id);
        tracing::debug!("User {} unregistered from MessagePusher", user_id);
    }

    async fn push_to(&self, user_id: &UserId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        let sender = clients
            .get(user_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(user_id.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed frame to user {}", user_id);

        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<UserId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push frame to user {}: {}", target, e);
                    }
                }
                None => {
                    tracing::warn!("User {} not connected during broadcast, skipping", target);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn uid(value: i64) -> UserId {
        UserId::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 登録済みのクライアントにフレームを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(uid(1), tx).await;

        // when (操作):
        let result = pusher.push_to(&uid(1), "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 未接続のクライアントへの送信は ClientNotFound を返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.push_to(&uid(9), "Hello").await;

        // then (期待する結果):
        assert_eq!(result, Err(MessagePushError::ClientNotFound("9".to_string())));
    }

    #[tokio::test]
    async fn test_push_to_closed_channel_fails() {
        // テスト項目: 受信側が閉じたチャンネルへの送信は PushFailed を返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_client(uid(1), tx).await;
        drop(rx);

        // when (操作):
        let result = pusher.push_to(&uid(1), "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::PushFailed(_))));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: 一部のクライアントが未接続でもブロードキャストは成功する
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register_client(uid(1), tx1).await;
        pusher.register_client(uid(2), tx2).await;

        // when (操作):
        let result = pusher
            .broadcast(vec![uid(1), uid(2), uid(3)], "snapshot")
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some("snapshot".to_string()));
        assert_eq!(rx2.recv().await, Some("snapshot".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_client() {
        // テスト項目: 登録解除後は送信できない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register_client(uid(1), tx).await;

        // when (操作):
        pusher.unregister_client(&uid(1)).await;

        // then (期待する結果):
        assert_eq!(pusher.connected_count().await, 0);
        assert!(pusher.push_to(&uid(1), "Hello").await.is_err());
    }
}
