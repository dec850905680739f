//! Shared fixtures for realtime integration tests.
//!
//! Servers bind to `127.0.0.1:0` and run on the test's runtime, so every
//! test gets its own port.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use mova_realtime::{Channel, ChannelEvent, RealtimeConfig, ReconnectConfig, WebSocketClient};

/// How long a test waits for any single event before failing.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Push server (axum)
// ---------------------------------------------------------------------------

/// A running WebSocket server at `/ws`.
pub struct PushServer {
    pub url: String,
    /// Text frames received from clients, in order.
    pub inbound: mpsc::UnboundedReceiver<String>,
    /// Number of upgraded connections so far.
    pub connections: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct ServerState {
    frames: Arc<Vec<String>>,
    inbound: mpsc::UnboundedSender<String>,
    connections: Arc<AtomicUsize>,
    close_first_connection: bool,
}

/// Server that sends `frames` to every new connection, then records
/// everything the client sends.
pub async fn spawn_push_server(frames: Vec<String>) -> PushServer {
    spawn_server(frames, false).await
}

/// Like [`spawn_push_server`], but the first connection is closed by the
/// server right after the upgrade.
pub async fn spawn_closing_server(frames: Vec<String>) -> PushServer {
    spawn_server(frames, true).await
}

async fn spawn_server(frames: Vec<String>, close_first_connection: bool) -> PushServer {
    let (tx, inbound) = mpsc::unbounded_channel();
    let connections = Arc::new(AtomicUsize::new(0));
    let state = ServerState {
        frames: Arc::new(frames),
        inbound: tx,
        connections: Arc::clone(&connections),
        close_first_connection,
    };

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    PushServer {
        url: format!("ws://{addr}/ws"),
        inbound,
        connections,
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let n = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    let (mut sink, mut stream) = socket.split();

    if state.close_first_connection && n == 1 {
        let _ = sink.send(Message::Close(None)).await;
        return;
    }

    for frame in state.frames.iter() {
        if sink.send(Message::Text(frame.clone().into())).await.is_err() {
            return;
        }
    }

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                let _ = state.inbound.send(text.as_str().to_owned());
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Raw TCP faults
// ---------------------------------------------------------------------------

/// Server that accepts TCP connections and drops them before the
/// WebSocket handshake. Returns the URL and an accept counter.
pub async fn spawn_dropping_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });
    (format!("ws://{addr}/ws"), accepted)
}

/// URL of a port nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/ws")
}

/// Server that completes the handshake and hands each socket to `handler`.
pub async fn spawn_raw_server<F, Fut>(handler: F) -> String
where
    F: Fn(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    handler(ws).await;
                }
            });
        }
    });
    format!("ws://{addr}/ws")
}

// ---------------------------------------------------------------------------
// Client helpers
// ---------------------------------------------------------------------------

/// Config with a long heartbeat and a fast 10/20/40 ms backoff.
pub fn fast_config(url: &str) -> RealtimeConfig {
    RealtimeConfig {
        url: url.to_string(),
        heartbeat_interval: Duration::from_secs(60),
        reconnect: ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_attempts: 3,
        },
    }
}

/// Forward every event on `channel` into a queue the test can await.
pub fn record(
    client: &WebSocketClient,
    channel: impl Into<Channel>,
) -> mpsc::UnboundedReceiver<ChannelEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.subscribe(channel, move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Next recorded event, failing the test after [`EVENT_TIMEOUT`].
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Next text frame the server received, failing after [`EVENT_TIMEOUT`].
pub async fn next_inbound(server: &mut PushServer) -> serde_json::Value {
    let text = tokio::time::timeout(EVENT_TIMEOUT, server.inbound.recv())
        .await
        .expect("timed out waiting for client frame")
        .expect("server channel closed");
    serde_json::from_str(&text).unwrap()
}

/// Build an envelope frame.
pub fn frame(topic: &str, data: serde_json::Value) -> String {
    serde_json::json!({"type": topic, "data": data, "timestamp": 1_700_000_000_000_i64}).to_string()
}
