//! ドメイン層
//!
//! 値オブジェクト、エンティティ、およびインフラ層が実装する trait を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{ConversationKey, DirectMessage, PresenceSnapshot, User, UserRecord};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use message_pusher::{FrameEncoder, MessagePusher, PusherChannel};
pub use repository::{MessageRepository, PresenceRepository, UserRepository};
pub use value_object::{ClientMessageId, MessageContent, PasswordHash, Timestamp, UserId, Username};
