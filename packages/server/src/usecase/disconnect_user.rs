//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() メソッド
//! - 切断時にオンライン集合から外れ、残りのユーザーにスナップショットが届くこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断と通知
//! - エッジケース：最後のユーザーの切断（通知対象なし）、オンラインでないユーザー（冪等）

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    FrameEncoder, MessagePusher, PresenceRepository, PresenceSnapshot, UserId, UserRepository,
};

use super::snapshot::current_snapshot;

/// 切断のユースケース
pub struct DisconnectUserUseCase {
    users: Arc<dyn UserRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    presence_lock: Arc<Mutex<()>>,
    encode_snapshot: FrameEncoder<PresenceSnapshot>,
}

impl DisconnectUserUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        presence_lock: Arc<Mutex<()>>,
        encode_snapshot: FrameEncoder<PresenceSnapshot>,
    ) -> Self {
        Self {
            users,
            presence,
            message_pusher,
            presence_lock,
            encode_snapshot,
        }
    }

    /// 切断を実行し、残りのオンラインユーザーへスナップショットを配信する
    ///
    /// # Returns
    ///
    /// * `Some(PresenceSnapshot)` - 配信したスナップショット
    /// * `None` - ユーザーはオンラインではなかった（何もしない）
    pub async fn execute(&self, user_id: UserId) -> Option<PresenceSnapshot> {
        let _guard = self.presence_lock.lock().await;

        if !self.presence.mark_offline(user_id).await {
            tracing::debug!("User {} was not online, nothing to disconnect", user_id);
            return None;
        }
        self.message_pusher.unregister_client(&user_id).await;

        let snapshot = current_snapshot(self.users.as_ref(), self.presence.as_ref()).await;
        if !snapshot.is_empty() {
            let frame = (self.encode_snapshot)(&snapshot);
            if let Err(e) = self
                .message_pusher
                .broadcast(snapshot.user_ids(), &frame)
                .await
            {
                tracing::warn!("Failed to broadcast presence snapshot: {}", e);
            }
        }
        tracing::info!(
            "User {} is offline ({} online remaining)",
            user_id,
            snapshot.len()
        );

        Some(snapshot)
    }
}
