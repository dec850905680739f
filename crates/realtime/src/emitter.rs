//! Listener registry keyed by [`Channel`].
//!
//! [`EventEmitter`] is the fan-out hub behind the realtime client. Each
//! registration returns a [`SubscriptionId`] that identifies the
//! callback for later removal. The registry lock is released before any
//! callback runs, so listeners may subscribe, unsubscribe or call back
//! into the client.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::channel::{Channel, ChannelEvent};

/// A registered callback.
pub type Listener = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Handle identifying one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Registry = HashMap<Channel, Vec<(SubscriptionId, Listener)>>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: Mutex<Registry>,
    next_id: AtomicU64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` on `channel`.
    pub fn subscribe(&self, channel: Channel, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry().entry(channel).or_default().push((id, listener));
        id
    }

    /// Remove one listener (`Some(id)`) or every listener (`None`) from
    /// `channel`. Returns how many were removed.
    pub fn unsubscribe(&self, channel: &Channel, id: Option<SubscriptionId>) -> usize {
        let mut registry = self.registry();
        let Some(entries) = registry.get_mut(channel) else {
            return 0;
        };

        let before = entries.len();
        match id {
            Some(id) => entries.retain(|(existing, _)| *existing != id),
            None => entries.clear(),
        }
        let removed = before - entries.len();

        if entries.is_empty() {
            registry.remove(channel);
        }
        removed
    }

    /// Deliver `event` to every listener on its channel.
    ///
    /// Returns the number of listeners invoked. A panicking listener is
    /// logged and does not stop delivery to the rest.
    pub fn emit(&self, event: &ChannelEvent) -> usize {
        let channel = event.channel();
        let listeners: Vec<Listener> = match self.registry().get(&channel) {
            Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };

        for listener in &listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::error!(channel = %channel, "Realtime listener panicked");
            }
        }
        listeners.len()
    }

    pub fn listener_count(&self, channel: &Channel) -> usize {
        self.registry().get(channel).map_or(0, Vec::len)
    }

    /// Drop every listener on every channel.
    pub fn clear(&self) {
        self.registry().clear();
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<String, usize> = self
            .registry()
            .iter()
            .map(|(channel, entries)| (channel.to_string(), entries.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
