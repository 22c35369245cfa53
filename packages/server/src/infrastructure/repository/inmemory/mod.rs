//! InMemory Repository 実装
//!
//! プロセス内の `tokio::sync::Mutex` で保護されたコレクションをストレージとして使います。
//! 再起動するとデータは失われます。

mod message;
mod presence;
mod user;

pub use message::InMemoryMessageRepository;
pub use presence::InMemoryPresenceRepository;
pub use user::InMemoryUserRepository;
