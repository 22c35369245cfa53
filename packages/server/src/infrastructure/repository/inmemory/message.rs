//! InMemory Message Repository 実装
//!
//! 会話キーごとに `Vec<DirectMessage>` を保持します。追記はロック内で
//! `created_at` の位置に挿入するため、読み出し側で並べ替える必要はありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConversationKey, DirectMessage, MessageRepository, RepositoryError};

#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    conversations: Mutex<HashMap<ConversationKey, Vec<DirectMessage>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: DirectMessage) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        let history = conversations.entry(message.conversation_key()).or_default();

        // 同時刻のメッセージは追記順を保つ
        let position = history.partition_point(|m| m.created_at <= message.created_at);
        history.insert(position, message);

        Ok(())
    }

    async fn find_conversation(&self, key: ConversationKey) -> Vec<DirectMessage> {
        let conversations = self.conversations.lock().await;
        conversations.get(&key).cloned().unwrap_or_default()
    }
}
