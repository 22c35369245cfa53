//! メッセージ通知（Push）の抽象化
//!
//! UseCase 層はこの trait を通じて接続中のクライアントへフレームを送ります。
//! WebSocket 実装は `infrastructure::message_pusher` にあります。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, UserId};

/// クライアントへ送信する JSON フレームのチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ドメインオブジェクトをクライアント向けフレーム（JSON）に変換する関数
///
/// UseCase 層はワイヤフォーマットを知らないため、起動時に Infrastructure 層の
/// 変換関数を注入します。
pub type FrameEncoder<T> = fn(&T) -> String;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, user_id: UserId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除
    async fn unregister_client(&self, user_id: &UserId);

    /// 特定のクライアントに送信。未接続なら `ClientNotFound`
    async fn push_to(&self, user_id: &UserId, content: &str) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信（一部の失敗は許容）
    async fn broadcast(&self, targets: Vec<UserId>, content: &str)
    -> Result<(), MessagePushError>;
}
