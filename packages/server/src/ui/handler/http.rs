//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::UserId,
    infrastructure::dto::{
        conversion::user_to_dto,
        http::{
            ErrorResponse, HistoryQuery, LoginRequest, LoginResponse, LogoutRequest,
            RegisterRequest, RegisteredUserDto, StatusResponse, UserDto,
        },
        websocket::MessageDto,
    },
    ui::state::AppState,
    usecase::{AuthError, HistoryError},
};

/// Non-2xx response with a `{"error": "..."}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::UsernameTaken(_) => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::UserNotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUserDto>), ApiError> {
    let user = state
        .register_user_usecase
        .execute(request.username, request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUserDto {
            id: user.id.value(),
            username: user.username.into_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .login_usecase
        .execute(request.username, request.password)
        .await?;

    Ok(Json(LoginResponse {
        user_id: user.id.value(),
        username: user.username.into_string(),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.logout_usecase.execute(request.user_id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// Get every registered user with the derived online flag
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<UserDto>> {
    let users = state.list_users_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(
        users
            .iter()
            .map(|status| user_to_dto(&status.user, status.is_online))
            .collect(),
    )
}

/// History Service: the conversation between `userId` and `targetId`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let user_id = UserId::new(query.user_id)
        .map_err(|_| ApiError::from(HistoryError::UserNotFound(query.user_id)))?;
    let target_id = UserId::new(query.target_id)
        .map_err(|_| ApiError::from(HistoryError::UserNotFound(query.target_id)))?;

    let messages = state
        .get_history_usecase
        .execute(user_id, target_id)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}
