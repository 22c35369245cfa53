//! Shared helpers for server integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use pairline_server::{
    infrastructure::dto::websocket::{ClientFrame, ServerFrame},
    ui::{AppState, Server},
};
use pairline_shared::time::SystemClock;
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper struct to manage an in-process server lifecycle
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server on an ephemeral port
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = Server::new(AppState::in_memory(Arc::new(SystemClock)));
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        TestServer {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Register a user over HTTP and return its id
    pub async fn register(&self, username: &str, password: &str) -> i64 {
        let response = reqwest::Client::new()
            .post(self.http_url("/api/auth/register"))
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.expect("invalid register body");
        body["id"].as_i64().expect("register response without id")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Helper struct for a raw Presence Channel connection
pub struct TestConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestConnection {
    pub async fn open(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect to /ws");
        Self { stream }
    }

    /// Open a connection and announce `online`
    pub async fn announce(server: &TestServer, user_id: i64) -> Self {
        let mut connection = Self::open(server).await;
        connection.send(&ClientFrame::Online { user_id }).await;
        connection
    }

    pub async fn send(&mut self, frame: &ClientFrame) {
        let json = serde_json::to_string(frame).expect("Failed to encode client frame");
        self.send_raw(&json).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server frame, or `None` when the server closed the connection
    pub async fn next_frame(&mut self) -> Option<ServerFrame> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")?;
            match message {
                Ok(Message::Text(text)) => {
                    return Some(
                        serde_json::from_str(text.as_str()).expect("Failed to decode server frame"),
                    );
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Next frame that must exist
    pub async fn expect_frame(&mut self) -> ServerFrame {
        self.next_frame()
            .await
            .expect("Connection closed while waiting for a frame")
    }

    /// Skip frames until an `onlineUsers` frame with exactly `ids` arrives
    pub async fn expect_online_ids(&mut self, ids: &[i64]) {
        loop {
            if let ServerFrame::OnlineUsers { users } = self.expect_frame().await {
                let online: Vec<i64> = users.iter().map(|u| u.id).collect();
                if online == ids {
                    return;
                }
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
