//! エンティティ
//!
//! - `User`: 登録済みユーザー
//! - `DirectMessage`: 2 ユーザー間のメッセージ（生成後は不変）
//! - `ConversationKey`: 会話を識別する順序なしのユーザーペア
//! - `PresenceSnapshot`: ある時点でオンラインのユーザー集合

use super::value_object::{
    ClientMessageId, MessageContent, PasswordHash, Timestamp, UserId, Username,
};

/// 登録済みユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
}

impl User {
    pub fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }
}

/// 認証情報付きのユーザーレコード（Repository 内部でのみ使用）
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// 会話キー
///
/// `ConversationKey::new(a, b) == ConversationKey::new(b, a)` が常に成り立つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
}

impl ConversationKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// `user_id` から見た会話相手を返す。`user_id` が含まれない場合は `None`。
    pub fn peer_of(&self, user_id: UserId) -> Option<UserId> {
        if self.low == user_id {
            Some(self.high)
        } else if self.high == user_id {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn members(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }
}

/// ダイレクトメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessage {
    pub sender_id: UserId,
    pub target_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub client_message_id: Option<ClientMessageId>,
}

impl DirectMessage {
    pub fn new(
        sender_id: UserId,
        target_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
        client_message_id: Option<ClientMessageId>,
    ) -> Self {
        Self {
            sender_id,
            target_id,
            content,
            created_at,
            client_message_id,
        }
    }

    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.sender_id, self.target_id)
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.target_id == user_id
    }

    /// 同一メッセージかどうかを判定する
    ///
    /// 送信者と宛先が一致することが前提。そのうえで両方に `client_message_id`
    /// があればそれで比較し、どちらかに無ければ `(created_at, content)` で比較する。
    /// `client_message_id` は送信者ごとの識別子なので、他人が同じ値を使っても別物。
    pub fn is_same_as(&self, other: &DirectMessage) -> bool {
        if self.sender_id != other.sender_id || self.target_id != other.target_id {
            return false;
        }
        match (&self.client_message_id, &other.client_message_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.created_at == other.created_at && self.content == other.content,
        }
    }
}

/// オンラインユーザーのスナップショット（差分ではなく全体）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    /// ID 昇順
    pub users: Vec<User>,
}

impl PresenceSnapshot {
    pub fn new(mut users: Vec<User>) -> Self {
        users.sort_by_key(|u| u.id);
        users.dedup_by_key(|u| u.id);
        Self { users }
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.users.iter().map(|u| u.id).collect()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.iter().any(|u| u.id == user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
