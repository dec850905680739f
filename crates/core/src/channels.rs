//! Well-known realtime channel name constants.
//!
//! Business channels are the `type` values the backend puts on WebSocket
//! frames. Lifecycle channels never travel over the wire; the realtime
//! client emits them locally.

// ---------------------------------------------------------------------------
// Lifecycle channels (client-internal)
// ---------------------------------------------------------------------------

/// The transport finished its handshake.
pub const CHANNEL_CONNECTED: &str = "connected";

/// An open transport was closed, intentionally or not.
pub const CHANNEL_DISCONNECTED: &str = "disconnected";

/// Advisory transport or protocol error.
pub const CHANNEL_ERROR: &str = "error";

/// Every inbound frame, regardless of its topic.
pub const CHANNEL_MESSAGE: &str = "message";

/// A reconnect attempt has been scheduled.
pub const CHANNEL_RECONNECTING: &str = "reconnecting";

/// Reconnect attempts are exhausted; the client has given up.
pub const CHANNEL_RECONNECT_FAILED: &str = "reconnect_failed";

/// All lifecycle channel names.
pub const LIFECYCLE_CHANNELS: &[&str] = &[
    CHANNEL_CONNECTED,
    CHANNEL_DISCONNECTED,
    CHANNEL_ERROR,
    CHANNEL_MESSAGE,
    CHANNEL_RECONNECTING,
    CHANNEL_RECONNECT_FAILED,
];

// ---------------------------------------------------------------------------
// Business channels (wire `type` values)
// ---------------------------------------------------------------------------

pub const TOPIC_SYSTEM_STATUS: &str = "system.status";
pub const TOPIC_SYSTEM_METRICS: &str = "system.metrics";
pub const TOPIC_ML_MODEL_UPDATE: &str = "ml.model.update";
pub const TOPIC_ML_TRAINING_PROGRESS: &str = "ml.training.progress";
pub const TOPIC_FILE_OPERATION: &str = "file.operation";
pub const TOPIC_USER_ACTIVITY: &str = "user.activity";
pub const TOPIC_NOTIFICATION: &str = "notification";
pub const TOPIC_CLI_OUTPUT: &str = "cli.output";
pub const TOPIC_PLUGIN_STATUS: &str = "plugin.status";
pub const TOPIC_DASHBOARD_UPDATE: &str = "dashboard.update";

/// Keep-alive frame sent by the client while the connection is open.
pub const TOPIC_HEARTBEAT: &str = "heartbeat";

/// Returns `true` if `name` is reserved for client-side lifecycle events.
pub fn is_lifecycle_channel(name: &str) -> bool {
    LIFECYCLE_CHANNELS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_names_are_reserved() {
        assert!(is_lifecycle_channel("connected"));
        assert!(is_lifecycle_channel("reconnect_failed"));
        assert!(is_lifecycle_channel("message"));
    }

    #[test]
    fn business_topics_are_not_reserved() {
        assert!(!is_lifecycle_channel(TOPIC_SYSTEM_STATUS));
        assert!(!is_lifecycle_channel(TOPIC_HEARTBEAT));
        assert!(!is_lifecycle_channel(""));
    }
}
