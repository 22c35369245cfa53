//! UseCase: ユーザー登録

use std::sync::Arc;

use crate::domain::{PasswordHash, RepositoryError, User, UserRepository, Username};

use super::error::AuthError;

pub struct RegisterUserUseCase {
    users: Arc<dyn UserRepository>,
}

impl RegisterUserUseCase {
    pub const MIN_PASSWORD_LENGTH: usize = 1;

    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn execute(&self, username: String, password: String) -> Result<User, AuthError> {
        let username = Username::new(username).map_err(|e| AuthError::Validation(e.to_string()))?;
        if password.chars().count() < Self::MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation("password must not be empty".to_string()));
        }

        let user = self
            .users
            .create(username, PasswordHash::from_plaintext(&password))
            .await
            .map_err(|e| match e {
                RepositoryError::UsernameTaken(name) => AuthError::UsernameTaken(name),
                other => AuthError::Storage(other.to_string()),
            })?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }
}
