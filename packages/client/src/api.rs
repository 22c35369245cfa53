//! HTTP API client: authentication, user list and History Service.

use async_trait::async_trait;
use pairline_server::{
    domain::{DirectMessage, User, UserId, Username},
    infrastructure::dto::{
        http::{
            ErrorResponse, LoginRequest, LoginResponse, LogoutRequest, RegisterRequest,
            RegisteredUserDto, UserDto,
        },
        websocket::MessageDto,
    },
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{directory::DirectoryEntry, error::ClientError, session_store::Session};

/// History Service: the ordered conversation between two users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn get_history(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<Vec<DirectMessage>, ClientError>;
}

/// reqwest-based client for the server's HTTP API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&RegisterRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        let user: RegisteredUserDto = decode(response).await?;

        Ok(Session {
            user_id: user.id,
            username: user.username,
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        let login: LoginResponse = decode(response).await?;

        Ok(Session {
            user_id: login.user_id,
            username: login.username,
        })
    }

    pub async fn logout(&self, session: &Session) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/logout"))
            .json(&LogoutRequest {
                user_id: session.user_id,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }

    /// Every registered user with the server's view of `isOnline`
    pub async fn list_users(&self) -> Result<Vec<DirectoryEntry>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/users"))
            .send()
            .await
            .map_err(transport_error)?;
        let users: Vec<UserDto> = decode(response).await?;

        // DTO から Domain Model への変換（不正な値は読み飛ばす）
        Ok(users
            .into_iter()
            .filter_map(|dto| {
                let id = UserId::new(dto.id).ok()?;
                let username = Username::new(dto.username).ok()?;
                Some(DirectoryEntry {
                    user: User::new(id, username),
                    is_online: dto.is_online,
                })
            })
            .collect())
    }
}

#[async_trait]
impl HistoryService for ApiClient {
    async fn get_history(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<Vec<DirectMessage>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/messages"))
            .query(&[("userId", user_id.value()), ("targetId", peer_id.value())])
            .send()
            .await
            .map_err(transport_error)?;
        let records: Vec<MessageDto> = decode(response).await?;

        records
            .into_iter()
            .map(|dto| {
                DirectMessage::try_from(dto)
                    .map_err(|e| ClientError::ConnectionError(format!("invalid history record: {}", e)))
            })
            .collect()
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    ClientError::ConnectionError(e.to_string())
}

/// Decode a 2xx body, or map the status and `{"error"}` body to a `ClientError`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(transport_error);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::CONFLICT => ClientError::Auth(message),
        _ => ClientError::ConnectionError(format!("{}: {}", status, message)),
    })
}
