//! Shared harness: an in-process relay on an ephemeral port and a thin
//! WebSocket client speaking the relay's JSON envelope.

#![allow(clippy::panic, dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use meeting_relay::app_state::AppState;
use meeting_relay::config::RelayConfig;
use meeting_relay::server;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// A relay running on `127.0.0.1:<ephemeral>`.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl TestRelay {
    pub async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    pub async fn start_with(config: RelayConfig) -> Self {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no local address");
        };
        let state = AppState::new(config);
        let serve_state = state.clone();
        tokio::spawn(async move {
            let _ = server::serve(listener, serve_state, std::future::pending()).await;
        });
        Self { addr, state }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Opens a relay connection and consumes the `connected` greeting.
    pub async fn connect(&self) -> TestClient {
        self.connect_path("/ws").await
    }

    pub async fn connect_path(&self, path_and_query: &str) -> TestClient {
        let url = format!("ws://{}{path_and_query}", self.addr);
        let Ok((stream, _)) = connect_async(url).await else {
            panic!("websocket connect failed");
        };
        let mut client = TestClient {
            stream,
            connection_id: String::new(),
        };
        let greeting = client.expect_event("connected").await;
        let Some(id) = greeting["connection_id"].as_str() else {
            panic!("connected event without connection_id");
        };
        client.connection_id = id.to_string();
        client
    }
}

/// One WebSocket client of the relay.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub connection_id: String,
}

impl TestClient {
    pub async fn send(&mut self, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data }).to_string();
        if self.stream.send(Message::text(frame)).await.is_err() {
            panic!("websocket send failed");
        }
    }

    pub async fn send_raw(&mut self, message: Message) {
        if self.stream.send(message).await.is_err() {
            panic!("websocket send failed");
        }
    }

    pub async fn join(&mut self, display_name: &str, meeting_id: &str) {
        self.send(
            "join",
            json!({ "display_name": display_name, "meeting_id": meeting_id }),
        )
        .await;
    }

    /// Next `{event, data}` frame, or `None` if nothing arrives in time.
    pub async fn try_next(&mut self, wait: Duration) -> Option<(String, Value)> {
        loop {
            let frame = tokio::time::timeout(wait, self.stream.next()).await.ok()??;
            let Ok(message) = frame else {
                return None;
            };
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("relay sent non-JSON text: {text}");
            };
            let name = value["event"].as_str().unwrap_or_default().to_string();
            return Some((name, value["data"].clone()));
        }
    }

    /// Asserts the next frame is `event` and returns its data.
    pub async fn expect_event(&mut self, event: &str) -> Value {
        let Some((name, data)) = self.try_next(RECV_TIMEOUT).await else {
            panic!("timed out waiting for {event}");
        };
        assert_eq!(name, event, "unexpected event with data {data}");
        data
    }

    /// Asserts nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        if let Some((name, data)) = self.try_next(SILENCE_WINDOW).await {
            panic!("expected silence, got {name}: {data}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
