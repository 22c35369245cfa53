//! Integration tests for the Presence Channel (`/ws`).

mod common;

use common::{TestConnection, TestServer};
use pairline_server::infrastructure::dto::websocket::{ClientFrame, ErrorCode, ServerFrame};

fn message(sender_id: i64, target_id: i64, content: &str, cid: Option<&str>) -> ClientFrame {
    ClientFrame::Message {
        sender_id,
        target_id,
        content: content.to_string(),
        client_message_id: cid.map(str::to_string),
    }
}

fn expect_error(frame: ServerFrame) -> (ErrorCode, Option<String>) {
    match frame {
        ServerFrame::Error {
            code,
            client_message_id,
            ..
        } => (code, client_message_id),
        other => panic!("expected an error frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_online_announcements_broadcast_full_snapshots() {
    // テスト項目: online のたびに全員へ完全なスナップショットが届き、切断で外れる
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let bob = server.register("bob", "pw").await;

    // when (操作):
    let mut alice_conn = TestConnection::announce(&server, alice).await;
    alice_conn.expect_online_ids(&[alice]).await;
    let mut bob_conn = TestConnection::announce(&server, bob).await;

    // then (期待する結果):
    bob_conn.expect_online_ids(&[alice, bob]).await;
    alice_conn.expect_online_ids(&[alice, bob]).await;

    bob_conn.close().await;
    alice_conn.expect_online_ids(&[alice]).await;
}

#[tokio::test]
async fn test_message_is_forwarded_and_echoed() {
    // テスト項目: メッセージが宛先に転送され、送信者にもエコーされ、履歴に残る
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let bob = server.register("bob", "pw").await;
    let mut alice_conn = TestConnection::announce(&server, alice).await;
    alice_conn.expect_online_ids(&[alice]).await;
    let mut bob_conn = TestConnection::announce(&server, bob).await;
    bob_conn.expect_online_ids(&[alice, bob]).await;
    alice_conn.expect_online_ids(&[alice, bob]).await;

    // when (操作):
    alice_conn.send(&message(alice, bob, "hello bob", Some("m-1"))).await;

    // then (期待する結果):
    let ServerFrame::Message { message: received } = bob_conn.expect_frame().await else {
        panic!("bob should receive a message frame");
    };
    assert_eq!(received.sender_id, alice);
    assert_eq!(received.target_id, Some(bob));
    assert_eq!(received.content, "hello bob");
    assert_eq!(received.client_message_id.as_deref(), Some("m-1"));

    let ServerFrame::Message { message: echoed } = alice_conn.expect_frame().await else {
        panic!("alice should receive the echo");
    };
    assert_eq!(echoed, received);

    let history: Vec<serde_json::Value> = reqwest::get(server.http_url(&format!(
        "/api/messages?userId={}&targetId={}",
        bob, alice
    )))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["createdAt"], received.created_at.as_str());
}

#[tokio::test]
async fn test_message_to_offline_user_is_kept_in_history() {
    // テスト項目: オフラインの宛先へのメッセージはエラーにならず履歴に残る
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let bob = server.register("bob", "pw").await;
    let mut alice_conn = TestConnection::announce(&server, alice).await;
    alice_conn.expect_online_ids(&[alice]).await;

    // when (操作):
    alice_conn.send(&message(alice, bob, "see you later", None)).await;

    // then (期待する結果):
    assert!(matches!(
        alice_conn.expect_frame().await,
        ServerFrame::Message { .. }
    ));
    let history: Vec<serde_json::Value> = reqwest::get(server.http_url(&format!(
        "/api/messages?userId={}&targetId={}",
        alice, bob
    )))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["content"], "see you later");
}

#[tokio::test]
async fn test_second_connection_for_same_user_is_rejected() {
    // テスト項目: 既にオンラインのユーザーの 2 本目の接続は duplicateSession で閉じられる
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let mut first = TestConnection::announce(&server, alice).await;
    first.expect_online_ids(&[alice]).await;

    // when (操作):
    let mut second = TestConnection::announce(&server, alice).await;

    // then (期待する結果):
    let (code, _) = expect_error(second.expect_frame().await);
    assert_eq!(code, ErrorCode::DuplicateSession);
    assert!(second.next_frame().await.is_none());

    // 1 本目の接続は生きている
    first.send(&message(alice, alice, "still here", Some("m-self"))).await;
    let (code, cid) = expect_error(first.expect_frame().await);
    assert_eq!(code, ErrorCode::Validation);
    assert_eq!(cid.as_deref(), Some("m-self"));
}

#[tokio::test]
async fn test_unknown_user_online_is_rejected_and_closed() {
    // テスト項目: 未登録ユーザーの online は notFound で閉じられる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let mut connection = TestConnection::announce(&server, 42).await;

    // then (期待する結果):
    let (code, _) = expect_error(connection.expect_frame().await);
    assert_eq!(code, ErrorCode::NotFound);
    assert!(connection.next_frame().await.is_none());
}

#[tokio::test]
async fn test_message_before_online_is_rejected() {
    // テスト項目: online 前の message は notAnnounced になり接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let bob = server.register("bob", "pw").await;
    let mut connection = TestConnection::open(&server).await;

    // when (操作):
    connection.send(&message(alice, bob, "too early", Some("m-0"))).await;

    // then (期待する結果):
    let (code, cid) = expect_error(connection.expect_frame().await);
    assert_eq!(code, ErrorCode::NotAnnounced);
    assert_eq!(cid.as_deref(), Some("m-0"));

    connection.send(&ClientFrame::Online { user_id: alice }).await;
    connection.expect_online_ids(&[alice]).await;
}

#[tokio::test]
async fn test_invalid_sends_are_rejected() {
    // テスト項目: 不正なフレーム・なりすまし・空本文・未知の宛先がそれぞれエラーになる
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = server.register("alice", "pw").await;
    let bob = server.register("bob", "pw").await;
    let mut connection = TestConnection::announce(&server, alice).await;
    connection.expect_online_ids(&[alice]).await;

    // when (操作) / then (期待する結果):
    connection.send_raw("not json").await;
    assert_eq!(expect_error(connection.expect_frame().await).0, ErrorCode::InvalidFrame);

    connection.send(&message(bob, alice, "spoofed", None)).await;
    assert_eq!(expect_error(connection.expect_frame().await).0, ErrorCode::Validation);

    connection.send(&message(alice, bob, "   ", None)).await;
    assert_eq!(expect_error(connection.expect_frame().await).0, ErrorCode::Validation);

    connection.send(&message(alice, 999, "anyone?", None)).await;
    assert_eq!(expect_error(connection.expect_frame().await).0, ErrorCode::NotFound);

    let history: Vec<serde_json::Value> = reqwest::get(server.http_url(&format!(
        "/api/messages?userId={}&targetId={}",
        alice, bob
    )))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert!(history.is_empty());
}
