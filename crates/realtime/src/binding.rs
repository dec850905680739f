//! Scope-bound subscriptions on a shared [`WebSocketClient`].
//!
//! A binding registers its own listeners when created and removes
//! exactly those listeners when dropped. Other subscriptions on the same
//! client are never touched, and dropping a binding never disconnects
//! the client.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::channel::{Channel, ChannelEvent};
use crate::client::WebSocketClient;
use crate::emitter::SubscriptionId;
use crate::messages::Topic;

// ---------------------------------------------------------------------------
// ConnectionBinding
// ---------------------------------------------------------------------------

/// Connection state as observed by a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingStatus {
    pub connected: bool,
    /// Message of the most recent `error` event, cleared on reconnect.
    pub last_error: Option<String>,
}

/// Mirrors the client's `connected` / `disconnected` / `error` channels
/// into a [`watch`] value for the lifetime of the binding.
pub struct ConnectionBinding {
    client: WebSocketClient,
    status: watch::Receiver<BindingStatus>,
    subscriptions: Vec<(Channel, SubscriptionId)>,
}

impl ConnectionBinding {
    /// Bind to `client`. When `auto_connect` is set and the client is not
    /// connected, `connect()` is triggered after the listeners are in place.
    pub fn attach(client: &WebSocketClient, auto_connect: bool) -> Self {
        let (tx, status) = watch::channel(BindingStatus {
            connected: client.is_connected(),
            last_error: None,
        });
        let tx = Arc::new(tx);

        let mut subscriptions = Vec::with_capacity(3);

        let on_connected = Arc::clone(&tx);
        subscriptions.push((
            Channel::Connected,
            client.subscribe(Channel::Connected, move |_| {
                on_connected.send_modify(|s| {
                    s.connected = true;
                    s.last_error = None;
                });
            }),
        ));

        let on_disconnected = Arc::clone(&tx);
        subscriptions.push((
            Channel::Disconnected,
            client.subscribe(Channel::Disconnected, move |_| {
                on_disconnected.send_modify(|s| s.connected = false);
            }),
        ));

        let on_error = tx;
        subscriptions.push((
            Channel::Error,
            client.subscribe(Channel::Error, move |event| {
                if let ChannelEvent::Error(e) = event {
                    let message = e.to_string();
                    on_error.send_modify(|s| s.last_error = Some(message));
                }
            }),
        ));

        if auto_connect && !client.is_connected() {
            client.connect();
        }

        Self {
            client: client.clone(),
            status,
            subscriptions,
        }
    }

    pub fn status(&self) -> BindingStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().connected
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.borrow().last_error.clone()
    }

    /// Receiver that observes every status change.
    pub fn watch(&self) -> watch::Receiver<BindingStatus> {
        self.status.clone()
    }

    /// Wait until the binding observes an open connection.
    pub async fn wait_connected(&self) {
        let mut rx = self.status.clone();
        // The sender lives inside our listeners, which outlive this borrow.
        let _ = rx.wait_for(|s| s.connected).await;
    }

    pub fn client(&self) -> &WebSocketClient {
        &self.client
    }
}

impl Drop for ConnectionBinding {
    fn drop(&mut self) {
        unsubscribe_all(&self.client, &mut self.subscriptions);
    }
}

// ---------------------------------------------------------------------------
// TopicCache
// ---------------------------------------------------------------------------

/// A payload received on a cached topic.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload {
    pub data: serde_json::Value,
    /// Server timestamp from the envelope (ms since epoch).
    pub timestamp: i64,
    /// Local receive time.
    pub received_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    latest: HashMap<Topic, CachedPayload>,
    history: HashMap<Topic, VecDeque<CachedPayload>>,
}

/// Keeps the latest payload, and optionally a bounded history, for a set
/// of topics.
pub struct TopicCache {
    client: WebSocketClient,
    state: Arc<Mutex<CacheState>>,
    topics: Vec<Topic>,
    subscriptions: Vec<(Channel, SubscriptionId)>,
}

impl TopicCache {
    /// Cache the latest payload of each topic.
    pub fn new<I, T>(client: &WebSocketClient, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        Self::with_history(client, topics, 0)
    }

    /// Cache the latest payload of each topic plus the last
    /// `history_limit` payloads per topic.
    pub fn with_history<I, T>(client: &WebSocketClient, topics: I, history_limit: usize) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        let state = Arc::new(Mutex::new(CacheState::default()));
        let mut cached: Vec<Topic> = Vec::new();
        let mut subscriptions = Vec::new();

        for topic in topics.into_iter().map(Into::into) {
            if cached.contains(&topic) {
                continue;
            }
            let sink = Arc::clone(&state);
            let channel = Channel::Topic(topic.clone());
            let id = client.subscribe(channel.clone(), move |event| {
                if let ChannelEvent::Data {
                    topic,
                    data,
                    timestamp,
                } = event
                {
                    let payload = CachedPayload {
                        data: data.clone(),
                        timestamp: *timestamp,
                        received_at: Utc::now(),
                    };
                    record(&mut lock(&sink), topic, payload, history_limit);
                }
            });
            subscriptions.push((channel, id));
            cached.push(topic);
        }

        tracing::debug!(topics = cached.len(), history_limit, "Topic cache attached");

        Self {
            client: client.clone(),
            state,
            topics: cached,
            subscriptions,
        }
    }

    pub fn latest(&self, topic: &Topic) -> Option<CachedPayload> {
        lock(&self.state).latest.get(topic).cloned()
    }

    /// Latest payload of `topic` decoded into `T`.
    pub fn latest_as<T: DeserializeOwned>(&self, topic: &Topic) -> Option<Result<T, serde_json::Error>> {
        self.latest(topic).map(|p| serde_json::from_value(p.data))
    }

    /// Retained payloads for `topic`, oldest first.
    pub fn history(&self, topic: &Topic) -> Vec<CachedPayload> {
        lock(&self.state)
            .history
            .get(topic)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.latest.clear();
        state.history.clear();
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl Drop for TopicCache {
    fn drop(&mut self) {
        unsubscribe_all(&self.client, &mut self.subscriptions);
    }
}

// ---- private helpers ----

fn record(state: &mut CacheState, topic: &Topic, payload: CachedPayload, history_limit: usize) {
    if history_limit > 0 {
        let history = state.history.entry(topic.clone()).or_default();
        if history.len() == history_limit {
            history.pop_front();
        }
        history.push_back(payload.clone());
    }
    state.latest.insert(topic.clone(), payload);
}

fn unsubscribe_all(client: &WebSocketClient, subscriptions: &mut Vec<(Channel, SubscriptionId)>) {
    for (channel, id) in subscriptions.drain(..) {
        client.unsubscribe(channel, Some(id));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
