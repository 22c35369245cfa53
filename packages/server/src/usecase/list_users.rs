//! UseCase: ユーザー一覧の取得

use std::sync::Arc;

use crate::domain::{PresenceRepository, User, UserRepository};

/// オンライン状態付きのユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatus {
    pub user: User,
    pub is_online: bool,
}

pub struct ListUsersUseCase {
    users: Arc<dyn UserRepository>,
    presence: Arc<dyn PresenceRepository>,
}

impl ListUsersUseCase {
    pub fn new(users: Arc<dyn UserRepository>, presence: Arc<dyn PresenceRepository>) -> Self {
        Self { users, presence }
    }

    /// 登録済みの全ユーザーを ID 昇順で返す
    pub async fn execute(&self) -> Vec<UserStatus> {
        let online = self.presence.online_user_ids().await;
        self.users
            .list()
            .await
            .into_iter()
            .map(|user| {
                let is_online = online.contains(&user.id);
                UserStatus { user, is_online }
            })
            .collect()
    }
}
