//! UseCase: ログアウト
//!
//! ログアウトは HTTP 上の確認だけを行う。オンライン状態はライブ接続の
//! 切断でのみ変わるため、ここでは Presence を変更しない。

use std::sync::Arc;

use crate::domain::{User, UserId, UserRepository};

use super::error::AuthError;

pub struct LogoutUseCase {
    users: Arc<dyn UserRepository>,
}

impl LogoutUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn execute(&self, user_id: i64) -> Result<User, AuthError> {
        let id = UserId::new(user_id).map_err(|_| AuthError::UserNotFound(user_id))?;
        let user = self
            .users
            .find_by_id(id)
            .await
            .ok_or(AuthError::UserNotFound(user_id))?;
        tracing::info!("User {} logged out", user.id);
        Ok(user)
    }
}
