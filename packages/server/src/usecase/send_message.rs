//! UseCase: メッセージ送信処理（Message Router）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - バリデーション → createdAt 付与 → 永続化 → 宛先への転送 → 送信者へのエコー
//!
//! ### なぜこのテストが必要か
//! - 永続化が成功すれば、宛先がオフラインでも送信は成功しなければならない
//! - 永続化前に弾くべき送信（自分宛て、存在しない宛先）が履歴に残らないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：宛先オンライン（転送 + エコー）、宛先オフライン（永続化のみ）
//! - 異常系：自分宛て、存在しない宛先

use std::sync::Arc;

use pairline_shared::time::Clock;

use crate::domain::{
    ClientMessageId, DirectMessage, FrameEncoder, MessageContent, MessagePushError, MessagePusher,
    MessageRepository, Timestamp, UserId, UserRepository,
};

use super::error::SendMessageError;

/// 宛先へのライブ転送の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// 宛先の Presence Channel に転送した
    Delivered,
    /// 宛先はオフライン（次回の履歴取得で届く）
    TargetOffline,
}

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: DirectMessage,
    pub delivery: Delivery,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    encode_message: FrameEncoder<DirectMessage>,
}

impl SendMessageUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        messages: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        encode_message: FrameEncoder<DirectMessage>,
    ) -> Self {
        Self {
            users,
            messages,
            message_pusher,
            clock,
            encode_message,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信者（接続でアナウンス済みのユーザー）
    /// * `target_id` - 宛先
    /// * `content` - 本文（空でないことは値オブジェクトで保証済み）
    /// * `client_message_id` - クライアントが採番した ID（重複排除用）
    ///
    /// # Returns
    ///
    /// * `Ok(SentMessage)` - 永続化に成功（転送の成否は `delivery` に入る）
    /// * `Err(SendMessageError)` - バリデーションまたは永続化の失敗
    pub async fn execute(
        &self,
        sender_id: UserId,
        target_id: UserId,
        content: MessageContent,
        client_message_id: Option<ClientMessageId>,
    ) -> Result<SentMessage, SendMessageError> {
        // 1. バリデーション
        if sender_id == target_id {
            return Err(SendMessageError::Validation(
                "cannot send a message to yourself".to_string(),
            ));
        }
        if self.users.find_by_id(target_id).await.is_none() {
            return Err(SendMessageError::TargetNotFound(target_id.value()));
        }

        // 2. createdAt を付与して永続化
        let message = DirectMessage::new(
            sender_id,
            target_id,
            content,
            Timestamp::new(self.clock.now_millis()),
            client_message_id,
        );
        self.messages
            .append(message.clone())
            .await
            .map_err(|e| SendMessageError::Persistence(e.to_string()))?;

        // 3. 宛先へ転送（オフラインはエラーではない）、送信者へエコー
        let frame = (self.encode_message)(&message);
        let delivery = match self.message_pusher.push_to(&target_id, &frame).await {
            Ok(()) => Delivery::Delivered,
            Err(MessagePushError::ClientNotFound(_)) => {
                tracing::debug!("User {} is offline, message kept in history", target_id);
                Delivery::TargetOffline
            }
            Err(e) => {
                tracing::warn!("Failed to forward message to user {}: {}", target_id, e);
                Delivery::TargetOffline
            }
        };
        if let Err(e) = self.message_pusher.push_to(&sender_id, &frame).await {
            tracing::debug!("Could not echo message back to user {}: {}", sender_id, e);
        }

        tracing::info!(
            "Routed message {} -> {} ({:?})",
            sender_id,
            target_id,
            delivery
        );

        Ok(SentMessage { message, delivery })
    }
}
