//! Shared application state.

use std::sync::Arc;

use pairline_shared::time::Clock;
use tokio::sync::Mutex;

use crate::{
    infrastructure::{
        dto::conversion::{encode_direct_message, encode_presence_snapshot},
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryMessageRepository, InMemoryPresenceRepository, InMemoryUserRepository},
    },
    usecase::{
        ConnectUserUseCase, DisconnectUserUseCase, GetHistoryUseCase, ListUsersUseCase,
        LoginUseCase, LogoutUseCase, RegisterUserUseCase, SendMessageUseCase,
    },
};

/// ハンドラーから参照する UseCase 一式
pub struct AppState {
    /// ConnectUserUseCase（`online` アナウンス）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// DisconnectUserUseCase（切断）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    /// SendMessageUseCase（Message Router）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetHistoryUseCase（History Service）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    pub list_users_usecase: Arc<ListUsersUseCase>,
    pub register_user_usecase: Arc<RegisterUserUseCase>,
    pub login_usecase: Arc<LoginUseCase>,
    pub logout_usecase: Arc<LogoutUseCase>,
}

impl AppState {
    /// インメモリのストアで依存関係を組み立てる
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        // 1. Repository
        let users = Arc::new(InMemoryUserRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let presence = Arc::new(InMemoryPresenceRepository::new());

        // 2. MessagePusher
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. UseCases
        let presence_lock = Arc::new(Mutex::new(()));
        let connect_user_usecase = Arc::new(ConnectUserUseCase::new(
            users.clone(),
            presence.clone(),
            message_pusher.clone(),
            clock.clone(),
            presence_lock.clone(),
            encode_presence_snapshot,
        ));
        let disconnect_user_usecase = Arc::new(DisconnectUserUseCase::new(
            users.clone(),
            presence.clone(),
            message_pusher.clone(),
            presence_lock,
            encode_presence_snapshot,
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            users.clone(),
            messages.clone(),
            message_pusher,
            clock,
            encode_direct_message,
        ));

        Self {
            connect_user_usecase,
            disconnect_user_usecase,
            send_message_usecase,
            get_history_usecase: Arc::new(GetHistoryUseCase::new(users.clone(), messages)),
            list_users_usecase: Arc::new(ListUsersUseCase::new(users.clone(), presence)),
            register_user_usecase: Arc::new(RegisterUserUseCase::new(users.clone())),
            login_usecase: Arc::new(LoginUseCase::new(users.clone())),
            logout_usecase: Arc::new(LogoutUseCase::new(users)),
        }
    }
}
