//! UseCase: 会話履歴の取得（History Service）

use std::sync::Arc;

use crate::domain::{ConversationKey, DirectMessage, MessageRepository, UserId, UserRepository};

use super::error::HistoryError;

pub struct GetHistoryUseCase {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl GetHistoryUseCase {
    pub fn new(users: Arc<dyn UserRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { users, messages }
    }

    /// 2 ユーザー間の全メッセージを `created_at` 昇順で返す
    ///
    /// 結果は引数の順序に依存しない。メッセージの無いペアは空の Vec。
    pub async fn execute(
        &self,
        user_id: UserId,
        target_id: UserId,
    ) -> Result<Vec<DirectMessage>, HistoryError> {
        for id in [user_id, target_id] {
            if self.users.find_by_id(id).await.is_none() {
                return Err(HistoryError::UserNotFound(id.value()));
            }
        }

        let messages = self
            .messages
            .find_conversation(ConversationKey::new(user_id, target_id))
            .await;
        tracing::debug!(
            "History {} <-> {}: {} message(s)",
            user_id,
            target_id,
            messages.len()
        );
        Ok(messages)
    }
}
