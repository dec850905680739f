//! Wire envelope and business channel catalog.
//!
//! Every frame in either direction is a JSON object with the shape
//! `{"type": "<topic>", "data": <any>, "timestamp": <ms epoch>}`. The
//! `type` field is parsed into a [`Topic`]; `data` stays opaque here and
//! is decoded by subscribers.

use mova_core::channels::{
    TOPIC_CLI_OUTPUT, TOPIC_DASHBOARD_UPDATE, TOPIC_FILE_OPERATION, TOPIC_HEARTBEAT,
    TOPIC_ML_MODEL_UPDATE, TOPIC_ML_TRAINING_PROGRESS, TOPIC_NOTIFICATION, TOPIC_PLUGIN_STATUS,
    TOPIC_SYSTEM_METRICS, TOPIC_SYSTEM_STATUS, TOPIC_USER_ACTIVITY,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// A business channel name.
///
/// Known catalog entries get their own variant; any other string is kept
/// in [`Topic::Other`]. Always build topics through `From<&str>` so that a
/// catalog name never ends up inside `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Topic {
    SystemStatus,
    SystemMetrics,
    MlModelUpdate,
    MlTrainingProgress,
    FileOperation,
    UserActivity,
    Notification,
    Heartbeat,
    CliOutput,
    PluginStatus,
    DashboardUpdate,
    Other(String),
}

impl Topic {
    /// Every catalog topic (excludes [`Topic::Other`]).
    pub const CATALOG: [Topic; 11] = [
        Topic::SystemStatus,
        Topic::SystemMetrics,
        Topic::MlModelUpdate,
        Topic::MlTrainingProgress,
        Topic::FileOperation,
        Topic::UserActivity,
        Topic::Notification,
        Topic::Heartbeat,
        Topic::CliOutput,
        Topic::PluginStatus,
        Topic::DashboardUpdate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Topic::SystemStatus => TOPIC_SYSTEM_STATUS,
            Topic::SystemMetrics => TOPIC_SYSTEM_METRICS,
            Topic::MlModelUpdate => TOPIC_ML_MODEL_UPDATE,
            Topic::MlTrainingProgress => TOPIC_ML_TRAINING_PROGRESS,
            Topic::FileOperation => TOPIC_FILE_OPERATION,
            Topic::UserActivity => TOPIC_USER_ACTIVITY,
            Topic::Notification => TOPIC_NOTIFICATION,
            Topic::Heartbeat => TOPIC_HEARTBEAT,
            Topic::CliOutput => TOPIC_CLI_OUTPUT,
            Topic::PluginStatus => TOPIC_PLUGIN_STATUS,
            Topic::DashboardUpdate => TOPIC_DASHBOARD_UPDATE,
            Topic::Other(name) => name,
        }
    }

    /// Returns `true` for names outside the catalog.
    pub fn is_custom(&self) -> bool {
        matches!(self, Topic::Other(_))
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        match name {
            TOPIC_SYSTEM_STATUS => Topic::SystemStatus,
            TOPIC_SYSTEM_METRICS => Topic::SystemMetrics,
            TOPIC_ML_MODEL_UPDATE => Topic::MlModelUpdate,
            TOPIC_ML_TRAINING_PROGRESS => Topic::MlTrainingProgress,
            TOPIC_FILE_OPERATION => Topic::FileOperation,
            TOPIC_USER_ACTIVITY => Topic::UserActivity,
            TOPIC_NOTIFICATION => Topic::Notification,
            TOPIC_HEARTBEAT => Topic::Heartbeat,
            TOPIC_CLI_OUTPUT => Topic::CliOutput,
            TOPIC_PLUGIN_STATUS => Topic::PluginStatus,
            TOPIC_DASHBOARD_UPDATE => Topic::DashboardUpdate,
            other => Topic::Other(other.to_string()),
        }
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        match Topic::from(name.as_str()) {
            Topic::Other(_) => Topic::Other(name),
            known => known,
        }
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        match topic {
            Topic::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The wire envelope carried by every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketEvent {
    #[serde(rename = "type")]
    pub topic: Topic,
    /// Opaque payload; validated by subscribers, not by the transport.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch. Frames without one are stamped
    /// on receipt.
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

impl WebSocketEvent {
    /// Build an outbound envelope stamped with the current time.
    pub fn new(topic: impl Into<Topic>, data: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            data,
            timestamp: now_millis(),
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Parse a text frame into an envelope.
///
/// Returns `Err` for malformed JSON or a missing `type` field. Callers
/// should report the error and keep the connection open.
pub fn parse_event(text: &str) -> Result<WebSocketEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Serialize an envelope into the text of a frame.
pub fn encode_event(event: &WebSocketEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_catalog_topic() {
        let json = r#"{"type":"system.status","data":{"ok":true},"timestamp":1700000000000}"#;
        let event = parse_event(json).unwrap();
        assert_eq!(event.topic, Topic::SystemStatus);
        assert_eq!(event.data, json!({"ok": true}));
        assert_eq!(event.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn parse_custom_topic() {
        let json = r#"{"type":"build.finished","data":[1,2],"timestamp":5}"#;
        let event = parse_event(json).unwrap();
        assert_eq!(event.topic, Topic::Other("build.finished".into()));
        assert!(event.topic.is_custom());
    }

    #[test]
    fn parse_without_data_or_timestamp() {
        let before = now_millis();
        let event = parse_event(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(event.topic, Topic::Heartbeat);
        assert!(event.data.is_null());
        assert!(event.timestamp >= before);
    }

    #[test]
    fn parse_without_type_returns_error() {
        assert!(parse_event(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn parse_invalid_json_returns_error() {
        assert!(parse_event("not json at all").is_err());
    }

    #[test]
    fn encode_uses_wire_field_names() {
        let event = WebSocketEvent {
            topic: Topic::Notification,
            data: json!({"title": "Done"}),
            timestamp: 42,
        };
        let value: serde_json::Value = serde_json::from_str(&encode_event(&event).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "notification", "data": {"title": "Done"}, "timestamp": 42})
        );
    }

    #[test]
    fn string_conversions_never_hide_catalog_names() {
        for topic in Topic::CATALOG {
            let name = topic.to_string();
            assert_eq!(Topic::from(name.clone()), topic);
            assert!(!Topic::from(name).is_custom());
        }
    }
}
