//! Presence Channel: the live WebSocket connection of one session.
//!
//! `connect` opens the socket, announces `online` and waits for the server's
//! first answer, so a rejected announcement (`duplicateSession`, unknown user)
//! surfaces as a `connect` error rather than as a later event.
//! After that every inbound frame becomes a [`ChannelEvent`]; a broken
//! connection ends the stream with exactly one `Disconnected`.

use std::time::Duration;

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use pairline_server::{
    domain::{DirectMessage, PresenceSnapshot, User, UserId},
    infrastructure::dto::{
        conversion::message_for_recipient,
        websocket::{ClientFrame, ErrorCode, ServerFrame},
    },
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Events delivered to the owner of the channel, in wire arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Authoritative online set (replace, never merge)
    PresenceSnapshot(PresenceSnapshot),
    /// Any inbound message, whichever conversation it belongs to
    Message(DirectMessage),
    /// An `error` frame for something this session sent
    ServerError {
        code: ErrorCode,
        message: String,
        client_message_id: Option<String>,
    },
    /// The connection is gone; no further events follow
    Disconnected(ClientError),
}

/// Capability to send a message over a live connection
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink: Send + Sync {
    /// Queue the message for the wire (fire-and-forget)
    fn send(&self, message: &DirectMessage) -> Result<(), ClientError>;
}

/// Handle of an open Presence Channel
///
/// Dropping the handle aborts its tasks, which closes the socket.
pub struct PresenceChannel {
    user_id: UserId,
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PresenceChannel {
    /// Open the channel and announce `online` for `user_id`
    ///
    /// # Errors
    ///
    /// * `ConnectionError` - the transport could not be established or closed early
    /// * `DuplicateSession` - the user is already online on another connection
    /// * `NotFound` - the server does not know `user_id`
    pub async fn connect(
        url: &str,
        user_id: UserId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), ClientError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let online = encode(&ClientFrame::Online {
            user_id: user_id.value(),
        })?;
        write
            .send(Message::Text(online.into()))
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let first = tokio::time::timeout(HANDSHAKE_TIMEOUT, next_server_frame(&mut read))
            .await
            .map_err(|_| {
                ClientError::ConnectionError("timed out waiting for presence snapshot".to_string())
            })??;
        if let ServerFrame::Error { code, message, .. } = &first {
            return Err(match code {
                ErrorCode::DuplicateSession => ClientError::DuplicateSession(user_id.value()),
                ErrorCode::NotFound => ClientError::NotFound(message.clone()),
                _ => ClientError::ConnectionError(message.clone()),
            });
        }
        tracing::info!("Presence Channel open for user {}", user_id);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        if let Some(event) = to_event(first, user_id) {
            let _ = events_tx.send(event);
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let reader = reader_loop(read, user_id, events_tx);
        let writer = writer_loop(outbound_rx, write);

        Ok((
            Self {
                user_id,
                outbound,
                reader,
                writer,
            },
            events_rx,
        ))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Send a Close frame and release the transport
    pub async fn close(mut self) {
        if self.outbound.send(Message::Close(None)).is_ok()
            && tokio::time::timeout(CLOSE_TIMEOUT, &mut self.writer)
                .await
                .is_err()
        {
            tracing::debug!("Close frame was not flushed in time");
        }
        tracing::info!("Presence Channel closed for user {}", self.user_id);
    }
}

impl MessageSink for PresenceChannel {
    fn send(&self, message: &DirectMessage) -> Result<(), ClientError> {
        if message.sender_id != self.user_id {
            return Err(ClientError::Validation(
                "can only send as the announced user".to_string(),
            ));
        }
        let json = encode(&ClientFrame::Message {
            sender_id: message.sender_id.value(),
            target_id: message.target_id.value(),
            content: message.content.as_str().to_string(),
            client_message_id: message
                .client_message_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
        })?;
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| ClientError::ConnectionError("channel is closed".to_string()))
    }
}

impl Drop for PresenceChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

fn encode(frame: &ClientFrame) -> Result<String, ClientError> {
    serde_json::to_string(frame).map_err(|e| ClientError::Validation(e.to_string()))
}

/// Read until the next decodable server frame
async fn next_server_frame(read: &mut SplitStream<WsStream>) -> Result<ServerFrame, ClientError> {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(text.as_str()) {
                Ok(frame) => return Ok(frame),
                Err(e) => tracing::warn!("Ignoring undecodable frame: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
        }
    }
    Err(ClientError::ConnectionError(
        "connection closed by server".to_string(),
    ))
}

/// Wire frame → event for the session of `self_id`
///
/// A `message` without `targetId` is addressed to this session. Records that
/// do not form valid domain values are dropped.
fn to_event(frame: ServerFrame, self_id: UserId) -> Option<ChannelEvent> {
    match frame {
        ServerFrame::OnlineUsers { users } => {
            let users = users
                .into_iter()
                .filter_map(|dto| User::try_from(dto).ok())
                .collect();
            Some(ChannelEvent::PresenceSnapshot(PresenceSnapshot::new(users)))
        }
        ServerFrame::Message { message } => match message_for_recipient(message, self_id) {
            Ok(message) => Some(ChannelEvent::Message(message)),
            Err(e) => {
                tracing::warn!("Ignoring invalid message frame: {}", e);
                None
            }
        },
        ServerFrame::Error {
            code,
            message,
            client_message_id,
        } => Some(ChannelEvent::ServerError {
            code,
            message,
            client_message_id,
        }),
    }
}

fn reader_loop(
    mut read: SplitStream<WsStream>,
    self_id: UserId,
    events: mpsc::UnboundedSender<ChannelEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            match next_server_frame(&mut read).await {
                Ok(frame) => {
                    if let Some(event) = to_event(frame, self_id)
                        && events.send(event).is_err()
                    {
                        return;
                    }
                }
                Err(e) => break e,
            }
        };
        tracing::warn!("Presence Channel disconnected: {}", reason);
        let _ = events.send(ChannelEvent::Disconnected(reason));
    })
}

fn writer_loop(
    mut outbound: mpsc::UnboundedReceiver<Message>,
    mut write: SplitSink<WsStream, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let is_close = matches!(message, Message::Close(_));
            if let Err(e) = write.send(message).await {
                tracing::warn!("Failed to write to Presence Channel: {}", e);
                break;
            }
            if is_close {
                break;
            }
        }
    })
}
