//! Realtime event client for the MOVA control panel.
//!
//! Provides a reconnecting WebSocket client with heartbeat, typed
//! channel routing and scoped subscription bindings:
//!
//! - [`WebSocketClient`]: one logical server-push connection with
//!   exponential-backoff reconnect and pub/sub over named channels.
//! - [`WebSocketEvent`] / [`Topic`]: the wire envelope and the
//!   business channel catalog.
//! - [`Channel`] / [`ChannelEvent`]: what listeners subscribe to and
//!   what they receive.
//! - [`ConnectionBinding`] / [`TopicCache`]: scope-bound listener sets
//!   that mirror connection state and cache topic payloads.

pub mod binding;
pub mod channel;
pub mod client;
pub mod config;
pub mod emitter;
pub mod heartbeat;
pub mod messages;
pub mod reconnect;
mod session;
pub mod transport;

pub use binding::{BindingStatus, CachedPayload, ConnectionBinding, TopicCache};
pub use channel::{Channel, ChannelEvent};
pub use client::{ConnectionState, WebSocketClient};
pub use config::RealtimeConfig;
pub use emitter::{EventEmitter, SubscriptionId};
pub use messages::{Topic, WebSocketEvent};
pub use reconnect::ReconnectConfig;
pub use transport::RealtimeError;
