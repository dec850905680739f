//! Reconnecting realtime WebSocket client.
//!
//! [`WebSocketClient`] maintains one logical connection to the server
//! push endpoint. [`connect`](WebSocketClient::connect) spawns a driver
//! task that opens the socket, runs the session, and on an unplanned
//! close schedules reconnects with exponential backoff until the attempt
//! ceiling, after which it emits `reconnect_failed` and stops.
//!
//! The client is an explicitly constructed service: create it once at
//! startup, clone the handle into whatever needs it, and call
//! [`shutdown`](WebSocketClient::shutdown) when the application exits.
//! Transport failures never surface as `Err`; they are delivered to
//! `error` listeners.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{Channel, ChannelEvent};
use crate::config::RealtimeConfig;
use crate::emitter::{EventEmitter, SubscriptionId};
use crate::messages::{Topic, WebSocketEvent};
use crate::reconnect::Backoff;
use crate::session::{run_session, SessionEnd};
use crate::transport::{self, RealtimeError};

/// How long `disconnect()` waits for the driver task to finish.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection state, mirroring the native WebSocket ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the realtime connection. Cheap to clone.
#[derive(Clone)]
pub struct WebSocketClient {
    inner: Arc<Inner>,
}

/// State shared between client handles and the driver task.
pub(crate) struct Inner {
    pub(crate) config: RealtimeConfig,
    pub(crate) emitter: EventEmitter,
    state: watch::Sender<ConnectionState>,
    /// Sender into the current session's outbound queue; `None` while
    /// no session is open.
    outbound: Mutex<Option<mpsc::UnboundedSender<WebSocketEvent>>>,
    driver: Mutex<Option<Driver>>,
    next_driver_id: AtomicU64,
    attempts: AtomicU32,
}

/// Bookkeeping for the running driver task.
struct Driver {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Inner {
    pub(crate) fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Realtime state change");
        }
    }

    fn emit(&self, event: ChannelEvent) {
        self.emitter.emit(&event);
    }

    /// Release the driver slot if it still belongs to driver `id`, so a
    /// `connect()` issued from a terminal listener starts a new driver.
    fn retire_driver(&self, id: u64) {
        let mut driver = lock(&self.driver);
        if driver.as_ref().is_some_and(|d| d.id == id) {
            *driver = None;
        }
    }
}

impl WebSocketClient {
    /// Create a client. Nothing connects until [`connect`](Self::connect).
    pub fn new(config: RealtimeConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Closed);
        Self {
            inner: Arc::new(Inner {
                config,
                emitter: EventEmitter::new(),
                state,
                outbound: Mutex::new(None),
                driver: Mutex::new(None),
                next_driver_id: AtomicU64::new(0),
                attempts: AtomicU32::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    /// Start connecting in the background.
    ///
    /// No-op while a connection is open, a handshake is in flight, or a
    /// reconnect is scheduled. Returns immediately; observe the outcome
    /// through the `connected` / `error` channels. Once the client has given
    /// up (including from a `reconnect_failed` listener), this starts a
    /// fresh cycle. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut driver = lock(&self.inner.driver);
        if let Some(existing) = driver.as_ref() {
            if !existing.handle.is_finished() {
                tracing::debug!(state = %self.connection_state(), "connect() ignored, connection already active");
                return;
            }
        }

        tracing::info!(url = %self.inner.config.url, "Connecting realtime client");
        self.inner.set_state(ConnectionState::Connecting);
        self.inner.attempts.store(0, Ordering::Relaxed);

        let id = self.inner.next_driver_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_driver(Arc::clone(&self.inner), cancel.clone(), id));
        *driver = Some(Driver { id, cancel, handle });
    }

    /// Close the connection on purpose.
    ///
    /// Suppresses auto-reconnect, cancels any pending backoff timer,
    /// closes the socket, and waits for the driver to stop. If a
    /// connection was open, `disconnected` is emitted with
    /// `intentional: true`.
    pub async fn disconnect(&self) {
        let driver = lock(&self.inner.driver).take();
        let Some(driver) = driver else {
            return;
        };

        tracing::info!("Disconnecting realtime client");
        driver.cancel.cancel();

        let abort = driver.handle.abort_handle();
        if tokio::time::timeout(DISCONNECT_TIMEOUT, driver.handle)
            .await
            .is_err()
        {
            tracing::warn!("Realtime driver did not stop in time, aborting");
            abort.abort();
        }

        *lock(&self.inner.outbound) = None;
        self.inner.set_state(ConnectionState::Closed);
    }

    /// Disconnect and drop every listener. Call once at application exit.
    pub async fn shutdown(&self) {
        self.disconnect().await;
        self.inner.emitter.clear();
        tracing::info!("Realtime client shut down");
    }

    /// Send `{type: topic, data, timestamp: now}` to the server.
    ///
    /// Returns `true` if the frame was queued on an open connection.
    /// Otherwise the frame is dropped, an `error` event is emitted, and
    /// `false` is returned; nothing is buffered for later delivery.
    pub fn send(&self, topic: impl Into<Topic>, data: serde_json::Value) -> bool {
        let frame = WebSocketEvent::new(topic, data);

        let rejected = if self.connection_state() == ConnectionState::Open {
            match lock(&self.inner.outbound).as_ref() {
                Some(tx) => tx.send(frame).err().map(|e| e.0),
                None => Some(frame),
            }
        } else {
            Some(frame)
        };

        match rejected {
            None => true,
            Some(frame) => {
                tracing::debug!(topic = %frame.topic, "Dropping frame, realtime client not connected");
                self.inner.emit(ChannelEvent::Error(Arc::new(RealtimeError::NotConnected(
                    frame.topic.to_string(),
                ))));
                false
            }
        }
    }

    /// Register `listener` on `channel`.
    ///
    /// Topic listeners receive [`ChannelEvent::Data`]; `message` listeners
    /// receive [`ChannelEvent::Message`] with the full envelope.
    pub fn subscribe<F>(&self, channel: impl Into<Channel>, listener: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        self.inner
            .emitter
            .subscribe(channel.into(), Arc::new(listener))
    }

    /// Register a typed listener on `topic`.
    ///
    /// Payloads that do not decode into `T` are logged and skipped.
    pub fn subscribe_data<T, F>(&self, topic: impl Into<Topic>, listener: F) -> SubscriptionId
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let channel = Channel::Topic(topic.clone());
        self.subscribe(channel, move |event| {
            if let ChannelEvent::Data { data, .. } = event {
                match T::deserialize(data) {
                    Ok(value) => listener(value),
                    Err(e) => tracing::warn!(
                        topic = %topic,
                        error = %e,
                        "Skipping payload that does not match subscriber type",
                    ),
                }
            }
        })
    }

    /// Remove one listener, or all listeners on `channel` when `id` is `None`.
    ///
    /// Returns the number of listeners removed.
    pub fn unsubscribe(&self, channel: impl Into<Channel>, id: Option<SubscriptionId>) -> usize {
        self.inner.emitter.unsubscribe(&channel.into(), id)
    }

    pub fn listener_count(&self, channel: impl Into<Channel>) -> usize {
        self.inner.emitter.listener_count(&channel.into())
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Open
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Reconnect attempts made since the last successful handshake.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("url", &self.inner.config.url)
            .field("state", &self.connection_state())
            .field("emitter", &self.inner.emitter)
            .finish()
    }
}

/// Connection loop: connect -> session -> backoff -> connect ...
///
/// Runs until cancelled or until reconnect attempts are exhausted.
async fn run_driver(inner: Arc<Inner>, cancel: CancellationToken, id: u64) {
    let mut backoff = Backoff::new(inner.config.reconnect.clone());

    loop {
        inner.set_state(ConnectionState::Connecting);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = transport::open(&inner.config.url) => result,
        };

        match result {
            Ok(ws_stream) => {
                backoff.reset();
                inner.attempts.store(0, Ordering::Relaxed);

                let (tx, rx) = mpsc::unbounded_channel();
                *lock(&inner.outbound) = Some(tx);
                inner.set_state(ConnectionState::Open);
                inner.emit(ChannelEvent::Connected);

                let end = run_session(ws_stream, rx, &inner, &cancel).await;

                *lock(&inner.outbound) = None;
                inner.set_state(ConnectionState::Closed);

                let intentional = matches!(end, SessionEnd::Cancelled);
                if let SessionEnd::Failed(e) = end {
                    inner.emit(ChannelEvent::Error(Arc::new(e)));
                }
                inner.emit(ChannelEvent::Disconnected { intentional });

                if intentional {
                    tracing::info!("Realtime connection closed by client");
                    return;
                }
                tracing::info!("Realtime connection lost");
            }
            Err(e) => {
                inner.set_state(ConnectionState::Closed);
                tracing::warn!(error = %e, "Realtime connection attempt failed");
                inner.emit(ChannelEvent::Error(Arc::new(e)));
            }
        }

        let Some((attempt, delay)) = backoff.next() else {
            let attempts = backoff.attempts();
            tracing::warn!(attempts, "Realtime reconnect attempts exhausted, giving up");
            inner.retire_driver(id);
            inner.emit(ChannelEvent::ReconnectFailed { attempts });
            return;
        };

        inner.attempts.store(attempt, Ordering::Relaxed);
        tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduling realtime reconnect",
        );
        inner.emit(ChannelEvent::Reconnecting { attempt, delay });

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    inner.set_state(ConnectionState::Closed);
    tracing::info!("Realtime reconnect cancelled");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
