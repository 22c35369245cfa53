//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ConversationKey, DirectMessage, PasswordHash, RepositoryError, Timestamp, User, UserId,
    UserRecord, Username,
};

/// 登録ユーザーのストア
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを新規作成し、採番された ID を持つ `User` を返す
    async fn create(
        &self,
        username: Username,
        password_hash: PasswordHash,
    ) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Option<User>;

    async fn find_record_by_username(&self, username: &Username) -> Option<UserRecord>;

    /// 全ユーザーを ID 昇順で返す
    async fn list(&self) -> Vec<User>;
}

/// メッセージ履歴のストア
///
/// 追記のみ。同じ会話への同時追記はどちらも失われずに保存されなければならない。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: DirectMessage) -> Result<(), RepositoryError>;

    /// 会話のメッセージを `created_at` 昇順（同時刻は追記順）で返す
    async fn find_conversation(&self, key: ConversationKey) -> Vec<DirectMessage>;
}

/// オンライン状態のストア（サーバーが観測したライブ接続のみを反映する）
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// オンラインにする。既にオンラインなら `AlreadyOnline`
    async fn mark_online(&self, user_id: UserId, since: Timestamp) -> Result<(), RepositoryError>;

    /// オフラインにする。オンラインだった場合 `true`
    async fn mark_offline(&self, user_id: UserId) -> bool;

    async fn is_online(&self, user_id: UserId) -> bool;

    /// オンラインのユーザー ID を昇順で返す
    async fn online_user_ids(&self) -> Vec<UserId>;
}
