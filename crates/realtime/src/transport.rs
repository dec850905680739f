//! WebSocket transport for the realtime endpoint.
//!
//! [`open`] performs the handshake and hands back the raw stream; the
//! client's driver task owns it from then on.

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// The raw WebSocket stream for reading/writing frames.
pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connect to the realtime WebSocket endpoint at `url`.
pub async fn open(url: &str) -> Result<WsStream, RealtimeError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| RealtimeError::Connection(format!("Failed to connect to {url}: {e}")))?;

    tracing::info!(url = %url, "Realtime WebSocket connected");
    Ok(ws_stream)
}

/// Errors surfaced by the realtime client through the `error` channel.
///
/// None of these are returned from the client's public methods; they are
/// delivered to `error` listeners instead.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An established connection failed while reading or writing.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame could not be parsed into an envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A frame was sent while the connection was not open and was dropped.
    #[error("Not connected: dropped outbound '{0}' frame")]
    NotConnected(String),

    /// An outbound envelope could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
