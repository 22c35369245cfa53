//! InMemory Presence Repository 実装

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PresenceRepository, RepositoryError, Timestamp, UserId};

/// オンラインユーザーと接続時刻のマップ
#[derive(Debug, Default)]
pub struct InMemoryPresenceRepository {
    online: Mutex<BTreeMap<UserId, Timestamp>>,
}

impl InMemoryPresenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn mark_online(&self, user_id: UserId, since: Timestamp) -> Result<(), RepositoryError> {
        let mut online = self.online.lock().await;
        if online.contains_key(&user_id) {
            return Err(RepositoryError::AlreadyOnline(user_id.to_string()));
        }
        online.insert(user_id, since);
        Ok(())
    }

    async fn mark_offline(&self, user_id: UserId) -> bool {
        let mut online = self.online.lock().await;
        online.remove(&user_id).is_some()
    }

    async fn is_online(&self, user_id: UserId) -> bool {
        let online = self.online.lock().await;
        online.contains_key(&user_id)
    }

    async fn online_user_ids(&self) -> Vec<UserId> {
        let online = self.online.lock().await;
        online.keys().copied().collect()
    }
}
