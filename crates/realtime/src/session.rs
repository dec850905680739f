//! Per-connection session loop.
//!
//! Drives one open WebSocket: inbound frames are parsed and fanned out,
//! queued outbound envelopes are written, heartbeats are sent on a timer,
//! and cancellation closes the socket. Returns when the connection ends.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelEvent;
use crate::client::{ConnectionState, Inner};
use crate::emitter::EventEmitter;
use crate::heartbeat::{heartbeat_frame, ticker};
use crate::messages::{encode_event, parse_event, WebSocketEvent};
use crate::transport::{RealtimeError, WsStream};

/// Upper bound on the closing handshake after `disconnect()`.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a session ended.
pub(crate) enum SessionEnd {
    /// `disconnect()` was called.
    Cancelled,
    /// The server closed the connection or the stream ended.
    Closed,
    /// A read or write on the socket failed.
    Failed(RealtimeError),
}

pub(crate) async fn run_session(
    ws_stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<WebSocketEvent>,
    inner: &Inner,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = ws_stream.split();
    let mut heartbeat = ticker(inner.config.heartbeat_interval);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                inner.set_state(ConnectionState::Closing);
                let close = async {
                    sink.send(Message::Close(None)).await?;
                    sink.close().await
                };
                match tokio::time::timeout(CLOSE_TIMEOUT, close).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(error = %e, "Error while closing realtime socket"),
                    Err(_) => tracing::debug!("Closing handshake timed out"),
                }
                return SessionEnd::Cancelled;
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&text, &inner.emitter);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary realtime frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Server closed realtime connection");
                        inner.set_state(ConnectionState::Closing);
                        return SessionEnd::Closed;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Realtime receive error");
                        return SessionEnd::Failed(RealtimeError::Transport(e.to_string()));
                    }
                    None => {
                        tracing::info!("Realtime stream exhausted");
                        return SessionEnd::Closed;
                    }
                }
            }

            Some(event) = outbound.recv() => {
                let text = match encode_event(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        inner.emitter.emit(&ChannelEvent::Error(Arc::new(e.into())));
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, topic = %event.topic, "Failed to send realtime frame");
                    return SessionEnd::Failed(RealtimeError::Transport(e.to_string()));
                }
            }

            _ = heartbeat.tick() => {
                let frame = heartbeat_frame();
                let text = match encode_event(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode heartbeat");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "Failed to send heartbeat");
                    return SessionEnd::Failed(RealtimeError::Transport(e.to_string()));
                }
                tracing::trace!("Sent realtime heartbeat");
            }
        }
    }
}

/// Parse one text frame and deliver it on its topic and on `message`.
fn handle_text(text: &str, emitter: &EventEmitter) {
    match parse_event(text) {
        Ok(event) => {
            tracing::trace!(topic = %event.topic, "Realtime frame received");
            for delivery in ChannelEvent::from_frame(event) {
                emitter.emit(&delivery);
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_message = %text,
                "Failed to parse realtime frame",
            );
            emitter.emit(&ChannelEvent::Error(Arc::new(RealtimeError::Protocol(
                e.to_string(),
            ))));
        }
    }
}
