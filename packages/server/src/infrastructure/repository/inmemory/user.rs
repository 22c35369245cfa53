//! InMemory User Repository 実装

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    PasswordHash, RepositoryError, User, UserId, UserRecord, UserRepository, Username,
};

#[derive(Debug)]
struct UserTable {
    next_id: i64,
    records: BTreeMap<UserId, UserRecord>,
}

/// インメモリ User Repository 実装
///
/// ID は 1 から順に採番します。
#[derive(Debug)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(UserTable {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(
        &self,
        username: Username,
        password_hash: PasswordHash,
    ) -> Result<User, RepositoryError> {
        let mut table = self.table.lock().await;

        if table
            .records
            .values()
            .any(|record| record.user.username == username)
        {
            return Err(RepositoryError::UsernameTaken(username.into_string()));
        }

        let id = UserId::new(table.next_id).map_err(|e| RepositoryError::Storage(e.to_string()))?;
        table.next_id += 1;

        let user = User::new(id, username);
        table.records.insert(
            id,
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );
        tracing::debug!("User '{}' created with id {}", user.username, id);

        Ok(user)
    }

    async fn find_by_id(&self, user_id: UserId) -> Option<User> {
        let table = self.table.lock().await;
        table.records.get(&user_id).map(|record| record.user.clone())
    }

    async fn find_record_by_username(&self, username: &Username) -> Option<UserRecord> {
        let table = self.table.lock().await;
        table
            .records
            .values()
            .find(|record| &record.user.username == username)
            .cloned()
    }

    async fn list(&self) -> Vec<User> {
        let table = self.table.lock().await;
        table.records.values().map(|record| record.user.clone()).collect()
    }
}
