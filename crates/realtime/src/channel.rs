//! Listener-facing channels and the events delivered on them.
//!
//! [`Channel`] names what a listener subscribes to: one of the
//! client-internal lifecycle channels or a business [`Topic`].
//! [`ChannelEvent`] is what the listener receives. Routing is decided by
//! [`ChannelEvent::channel`], an exhaustive match, so adding an event
//! kind without a route does not compile.

use std::sync::Arc;
use std::time::Duration;

use mova_core::channels::{
    CHANNEL_CONNECTED, CHANNEL_DISCONNECTED, CHANNEL_ERROR, CHANNEL_MESSAGE,
    CHANNEL_RECONNECTING, CHANNEL_RECONNECT_FAILED,
};
use serde::de::DeserializeOwned;

use crate::messages::{Topic, WebSocketEvent};
use crate::transport::RealtimeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Connected,
    Disconnected,
    Error,
    /// Every inbound frame, delivered as the full envelope.
    Message,
    Reconnecting,
    ReconnectFailed,
    /// Frames whose `type` matches the topic, delivered as their `data`.
    Topic(Topic),
}

impl Channel {
    pub fn name(&self) -> &str {
        match self {
            Channel::Connected => CHANNEL_CONNECTED,
            Channel::Disconnected => CHANNEL_DISCONNECTED,
            Channel::Error => CHANNEL_ERROR,
            Channel::Message => CHANNEL_MESSAGE,
            Channel::Reconnecting => CHANNEL_RECONNECTING,
            Channel::ReconnectFailed => CHANNEL_RECONNECT_FAILED,
            Channel::Topic(topic) => topic.as_str(),
        }
    }
}

impl From<Topic> for Channel {
    fn from(topic: Topic) -> Self {
        Channel::Topic(topic)
    }
}

/// Lifecycle names map to their lifecycle channel; anything else is a topic.
impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        match name {
            CHANNEL_CONNECTED => Channel::Connected,
            CHANNEL_DISCONNECTED => Channel::Disconnected,
            CHANNEL_ERROR => Channel::Error,
            CHANNEL_MESSAGE => Channel::Message,
            CHANNEL_RECONNECTING => Channel::Reconnecting,
            CHANNEL_RECONNECT_FAILED => Channel::ReconnectFailed,
            topic => Channel::Topic(Topic::from(topic)),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An event delivered to listeners.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The handshake completed; the connection is open.
    Connected,
    /// An open connection closed. `intentional` is `true` when the close
    /// came from `disconnect()`.
    Disconnected { intentional: bool },
    /// Advisory transport or protocol error.
    Error(Arc<RealtimeError>),
    /// A reconnect attempt is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Terminal: `attempts` reconnects failed and the client stopped.
    ReconnectFailed { attempts: u32 },
    /// Full envelope of an inbound frame.
    Message(WebSocketEvent),
    /// Payload of an inbound frame, routed by its topic.
    Data {
        topic: Topic,
        data: serde_json::Value,
        timestamp: i64,
    },
}

impl ChannelEvent {
    /// The channel this event is delivered on.
    pub fn channel(&self) -> Channel {
        match self {
            ChannelEvent::Connected => Channel::Connected,
            ChannelEvent::Disconnected { .. } => Channel::Disconnected,
            ChannelEvent::Error(_) => Channel::Error,
            ChannelEvent::Reconnecting { .. } => Channel::Reconnecting,
            ChannelEvent::ReconnectFailed { .. } => Channel::ReconnectFailed,
            ChannelEvent::Message(_) => Channel::Message,
            ChannelEvent::Data { topic, .. } => Channel::Topic(topic.clone()),
        }
    }

    /// The frame payload, for `Data` and `Message` events.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            ChannelEvent::Data { data, .. } => Some(data),
            ChannelEvent::Message(event) => Some(&event.data),
            _ => None,
        }
    }

    /// Decode the frame payload into `T`.
    ///
    /// Returns `None` for events that carry no payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.data().map(|data| T::deserialize(data))
    }

    /// Split a parsed frame into the two deliveries it produces: the
    /// payload on its topic, then the envelope on `message`.
    pub fn from_frame(event: WebSocketEvent) -> [ChannelEvent; 2] {
        let data = ChannelEvent::Data {
            topic: event.topic.clone(),
            data: event.data.clone(),
            timestamp: event.timestamp,
        };
        [data, ChannelEvent::Message(event)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn lifecycle_names_resolve_to_lifecycle_channels() {
        assert_eq!(Channel::from("connected"), Channel::Connected);
        assert_eq!(Channel::from("reconnect_failed"), Channel::ReconnectFailed);
        assert_eq!(Channel::from("message"), Channel::Message);
    }

    #[test]
    fn other_names_resolve_to_topics() {
        assert_eq!(Channel::from("system.status"), Channel::Topic(Topic::SystemStatus));
        assert_matches!(Channel::from("x"), Channel::Topic(Topic::Other(name)) if name == "x");
    }

    #[test]
    fn channel_names_round_trip() {
        for name in ["connected", "error", "notification", "custom.thing"] {
            assert_eq!(Channel::from(name).name(), name);
        }
    }

    #[test]
    fn frame_routes_to_topic_then_message() {
        let frame = WebSocketEvent {
            topic: Topic::UserActivity,
            data: json!({"user": "ana"}),
            timestamp: 9,
        };
        let [first, second] = ChannelEvent::from_frame(frame.clone());
        assert_eq!(first.channel(), Channel::Topic(Topic::UserActivity));
        assert_eq!(first.data(), Some(&json!({"user": "ana"})));
        assert_eq!(second.channel(), Channel::Message);
        assert_matches!(second, ChannelEvent::Message(env) if env == frame);
    }

    #[test]
    fn decode_payload() {
        #[derive(serde::Deserialize)]
        struct Status {
            ok: bool,
        }
        let event = ChannelEvent::Data {
            topic: Topic::SystemStatus,
            data: json!({"ok": true}),
            timestamp: 0,
        };
        let status: Status = event.decode().unwrap().unwrap();
        assert!(status.ok);
        assert!(ChannelEvent::Connected.decode::<Status>().is_none());
    }
}
