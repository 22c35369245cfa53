//! UseCase: オンラインアナウンス処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::execute() メソッド
//! - `online` 受信時の処理（ユーザー存在チェック、重複チェック、スナップショット配信）
//!
//! ### どのような状況を想定しているか
//! - 正常系：オンラインになったユーザーを含むスナップショットが全員に届く
//! - 異常系：未登録ユーザー、既にオンラインのユーザー

use std::sync::Arc;

use pairline_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    FrameEncoder, MessagePusher, PresenceRepository, PresenceSnapshot, PusherChannel, Timestamp,
    UserId, UserRepository,
};

use super::{error::ConnectError, snapshot::current_snapshot};

/// オンラインアナウンスのユースケース
pub struct ConnectUserUseCase {
    users: Arc<dyn UserRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// 状態変更とスナップショット配信を直列化する（DisconnectUserUseCase と共有）
    presence_lock: Arc<Mutex<()>>,
    encode_snapshot: FrameEncoder<PresenceSnapshot>,
}

impl ConnectUserUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        presence_lock: Arc<Mutex<()>>,
        encode_snapshot: FrameEncoder<PresenceSnapshot>,
    ) -> Self {
        Self {
            users,
            presence,
            message_pusher,
            clock,
            presence_lock,
            encode_snapshot,
        }
    }

    /// ユーザーをオンラインにして、新しいスナップショットを全オンラインユーザーに配信する
    ///
    /// # Arguments
    ///
    /// * `user_id` - アナウンスされたユーザー ID
    /// * `sender` - この接続へのフレーム送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceSnapshot)` - 配信したスナップショット（本人を含む）
    /// * `Err(ConnectError)` - 未登録ユーザー、または既にオンライン
    pub async fn execute(
        &self,
        user_id: UserId,
        sender: PusherChannel,
    ) -> Result<PresenceSnapshot, ConnectError> {
        if self.users.find_by_id(user_id).await.is_none() {
            return Err(ConnectError::UnknownUser(user_id.value()));
        }

        let _guard = self.presence_lock.lock().await;

        let since = Timestamp::new(self.clock.now_millis());
        self.presence
            .mark_online(user_id, since)
            .await
            .map_err(|_| ConnectError::AlreadyOnline(user_id.value()))?;
        self.message_pusher.register_client(user_id, sender).await;

        let snapshot = current_snapshot(self.users.as_ref(), self.presence.as_ref()).await;
        let frame = (self.encode_snapshot)(&snapshot);
        if let Err(e) = self
            .message_pusher
            .broadcast(snapshot.user_ids(), &frame)
            .await
        {
            tracing::warn!("Failed to broadcast presence snapshot: {}", e);
        }
        tracing::info!(
            "User {} is online ({} online in total)",
            user_id,
            snapshot.len()
        );

        Ok(snapshot)
    }
}
