//! UseCase: ログイン（資格情報の照合）

use std::sync::Arc;

use crate::domain::{User, UserRepository, Username};

use super::error::AuthError;

pub struct LoginUseCase {
    users: Arc<dyn UserRepository>,
}

impl LoginUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// ユーザー名とパスワードを照合する
    ///
    /// 存在しないユーザー名とパスワード不一致は区別せず `InvalidCredentials` を返す。
    pub async fn execute(&self, username: String, password: String) -> Result<User, AuthError> {
        let Ok(username) = Username::new(username) else {
            return Err(AuthError::InvalidCredentials);
        };

        match self.users.find_record_by_username(&username).await {
            Some(record) if record.password_hash.matches(&password) => {
                tracing::info!("User {} logged in", record.user.id);
                Ok(record.user)
            }
            _ => {
                tracing::debug!("Rejected login for '{}'", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
