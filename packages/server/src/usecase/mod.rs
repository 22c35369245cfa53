//! UseCase 層
//!
//! 1 ファイル 1 ユースケース。Repository / MessagePusher の trait にのみ依存します。

mod connect_user;
mod disconnect_user;
mod error;
mod get_history;
mod list_users;
mod login;
mod logout;
mod register_user;
mod send_message;
mod snapshot;

pub use connect_user::ConnectUserUseCase;
pub use disconnect_user::DisconnectUserUseCase;
pub use error::{AuthError, ConnectError, HistoryError, SendMessageError};
pub use get_history::GetHistoryUseCase;
pub use list_users::{ListUsersUseCase, UserStatus};
pub use login::LoginUseCase;
pub use logout::LogoutUseCase;
pub use register_user::RegisterUserUseCase;
pub use send_message::{Delivery, SendMessageUseCase, SentMessage};
