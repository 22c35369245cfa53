//! Presence snapshot construction shared by connect / disconnect.

use crate::domain::{PresenceRepository, PresenceSnapshot, UserRepository};

/// 現在オンラインのユーザーからスナップショットを作る
///
/// 登録情報の見つからない ID は含めない。
pub(crate) async fn current_snapshot(
    users: &dyn UserRepository,
    presence: &dyn PresenceRepository,
) -> PresenceSnapshot {
    let mut online = Vec::new();
    for user_id in presence.online_user_ids().await {
        match users.find_by_id(user_id).await {
            Some(user) => online.push(user),
            None => tracing::warn!("Online user {} has no user record, skipping", user_id),
        }
    }
    PresenceSnapshot::new(online)
}
