//! WebSocket connection handlers (Presence Channel).
//!
//! One connection per online user. The connection lifecycle is:
//!
//! 1. upgrade, then wait for `{type:"online", userId}`
//! 2. route `{type:"message"}` frames through the Message Router
//! 3. on close, mark the user offline and broadcast the new snapshot
//!
//! Outbound frames (snapshots, forwarded messages, errors) all go through one
//! `mpsc` channel drained by the pusher task, so the socket has one writer.

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ClientMessageId, MessageContent, PusherChannel, UserId},
    infrastructure::dto::websocket::{ClientFrame, ErrorCode, ServerFrame},
    ui::state::AppState,
    usecase::{ConnectError, SendMessageError},
};

/// How long pending outbound frames may take to flush after the reader ends
const FLUSH_GRACE: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// When every sender of the channel is gone (the reader finished and the user
/// was unregistered from the MessagePusher) the task sends a Close frame and exits.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

/// What the reader does after handling one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameOutcome {
    Continue,
    Close,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // The user this connection announced, set once by a successful `online`
    let announced: Arc<OnceLock<UserId>> = Arc::new(OnceLock::new());

    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let announced_clone = announced.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text: {}", text.as_str());
                    let outcome =
                        handle_text(&state_clone, &tx, &announced_clone, text.as_str()).await;
                    if outcome == FrameOutcome::Close {
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::debug!("Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // If either task completes, the connection is over
    tokio::select! {
        _ = &mut recv_task => {}
        _ = &mut send_task => recv_task.abort(),
    };

    if let Some(user_id) = announced.get() {
        state.disconnect_user_usecase.execute(*user_id).await;
    }

    // Let already queued frames (e.g. an error frame) reach the client
    if !send_task.is_finished() && tokio::time::timeout(FLUSH_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }
}

async fn handle_text(
    state: &AppState,
    tx: &PusherChannel,
    announced: &OnceLock<UserId>,
    text: &str,
) -> FrameOutcome {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Failed to parse frame: {}", e);
            reply(tx, ErrorCode::InvalidFrame, format!("invalid frame: {}", e), None);
            return FrameOutcome::Continue;
        }
    };

    match frame {
        ClientFrame::Online { user_id } => handle_online(state, tx, announced, user_id).await,
        ClientFrame::Message {
            sender_id,
            target_id,
            content,
            client_message_id,
        } => {
            handle_message(
                state,
                tx,
                announced,
                sender_id,
                target_id,
                content,
                client_message_id,
            )
            .await;
            FrameOutcome::Continue
        }
    }
}

async fn handle_online(
    state: &AppState,
    tx: &PusherChannel,
    announced: &OnceLock<UserId>,
    raw_user_id: i64,
) -> FrameOutcome {
    if let Some(current) = announced.get() {
        tracing::debug!("Ignoring repeated online from user {}", current);
        return FrameOutcome::Continue;
    }

    let Ok(user_id) = UserId::new(raw_user_id) else {
        reply(tx, ErrorCode::NotFound, format!("user {} does not exist", raw_user_id), None);
        return FrameOutcome::Close;
    };

    match state
        .connect_user_usecase
        .execute(user_id, tx.clone())
        .await
    {
        Ok(_) => {
            let _ = announced.set(user_id);
            FrameOutcome::Continue
        }
        Err(e @ ConnectError::UnknownUser(_)) => {
            tracing::warn!("Rejected online: {}", e);
            reply(tx, ErrorCode::NotFound, e.to_string(), None);
            FrameOutcome::Close
        }
        Err(e @ ConnectError::AlreadyOnline(_)) => {
            tracing::warn!("Rejected online: {}", e);
            reply(tx, ErrorCode::DuplicateSession, e.to_string(), None);
            FrameOutcome::Close
        }
    }
}

async fn handle_message(
    state: &AppState,
    tx: &PusherChannel,
    announced: &OnceLock<UserId>,
    sender_id: i64,
    target_id: i64,
    content: String,
    client_message_id: Option<String>,
) {
    let Some(announced_id) = announced.get().copied() else {
        reply(
            tx,
            ErrorCode::NotAnnounced,
            "send online before sending messages",
            client_message_id,
        );
        return;
    };
    if sender_id != announced_id.value() {
        reply(
            tx,
            ErrorCode::Validation,
            format!("senderId {} does not match this connection", sender_id),
            client_message_id,
        );
        return;
    }

    // Convert wire values -> Domain Models
    let Ok(target) = UserId::new(target_id) else {
        reply(
            tx,
            ErrorCode::NotFound,
            format!("target user {} not found", target_id),
            client_message_id,
        );
        return;
    };
    let content = match MessageContent::new(content) {
        Ok(content) => content,
        Err(e) => {
            reply(tx, ErrorCode::Validation, e.to_string(), client_message_id);
            return;
        }
    };
    let message_id = match client_message_id.clone().map(ClientMessageId::new).transpose() {
        Ok(id) => id,
        Err(e) => {
            reply(tx, ErrorCode::Validation, e.to_string(), client_message_id);
            return;
        }
    };

    if let Err(e) = state
        .send_message_usecase
        .execute(announced_id, target, content, message_id)
        .await
    {
        tracing::warn!("Failed to send message from user {}: {}", announced_id, e);
        let code = match e {
            SendMessageError::Validation(_) => ErrorCode::Validation,
            SendMessageError::TargetNotFound(_) => ErrorCode::NotFound,
            SendMessageError::Persistence(_) => ErrorCode::Internal,
        };
        reply(tx, code, e.to_string(), client_message_id);
    }
}

/// Queue an error frame for this connection
fn reply(
    tx: &PusherChannel,
    code: ErrorCode,
    message: impl Into<String>,
    client_message_id: Option<String>,
) {
    match ServerFrame::error(code, message, client_message_id).to_json() {
        Ok(json) => {
            if tx.send(json).is_err() {
                tracing::debug!("Connection closed before error frame could be queued");
            }
        }
        Err(e) => tracing::error!("Failed to encode error frame: {}", e),
    }
}
