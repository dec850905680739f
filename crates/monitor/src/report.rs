//! One-line descriptions of realtime events and backend status.

use mova_core::system::SystemStatus;
use mova_realtime::{ChannelEvent, TopicCache};

/// Longest payload excerpt included in a frame description.
const MAX_PAYLOAD_CHARS: usize = 200;

/// Describe an event for the log.
pub fn describe_event(event: &ChannelEvent) -> String {
    match event {
        ChannelEvent::Connected => "connected".to_string(),
        ChannelEvent::Disconnected { intentional: true } => "disconnected (client closed)".to_string(),
        ChannelEvent::Disconnected { intentional: false } => "disconnected (connection lost)".to_string(),
        ChannelEvent::Error(e) => format!("error: {e}"),
        ChannelEvent::Reconnecting { attempt, delay } => {
            format!("reconnect attempt {attempt} in {} ms", delay.as_millis())
        }
        ChannelEvent::ReconnectFailed { attempts } => {
            format!("gave up after {attempts} reconnect attempts")
        }
        ChannelEvent::Message(frame) => {
            format!("{} {}", frame.topic, excerpt(&frame.data.to_string()))
        }
        ChannelEvent::Data { topic, data, .. } => format!("{topic} {}", excerpt(&data.to_string())),
    }
}

/// Summarize a status snapshot: overall state, version, uptime and any
/// unhealthy components.
pub fn status_summary(status: &SystemStatus) -> String {
    let mut line = format!("backend {}", status.status);
    if let Some(version) = &status.version {
        line.push_str(&format!(" v{version}"));
    }
    if let Some(uptime) = status.uptime_seconds {
        line.push_str(&format!(", up {}", format_uptime(uptime)));
    }
    let unhealthy = status.unhealthy_components();
    if !unhealthy.is_empty() {
        line.push_str(&format!(", unhealthy: {}", unhealthy.join(", ")));
    }
    line
}

/// Topics that received at least one payload, with the server timestamp
/// of the latest one.
pub fn cache_summary(cache: &TopicCache) -> Vec<String> {
    cache
        .topics()
        .iter()
        .filter_map(|topic| {
            cache
                .latest(topic)
                .map(|payload| format!("{topic} @ {}", payload.timestamp))
        })
        .collect()
}

fn format_uptime(seconds: u64) -> String {
    let (days, rest) = (seconds / 86_400, seconds % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let minutes = rest / 60;
    match (days, hours) {
        (0, 0) => format!("{minutes}m"),
        (0, _) => format!("{hours}h{minutes:02}m"),
        _ => format!("{days}d{hours:02}h"),
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(MAX_PAYLOAD_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mova_realtime::{Topic, WebSocketEvent};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn describes_lifecycle_events() {
        assert_eq!(
            describe_event(&ChannelEvent::Reconnecting {
                attempt: 2,
                delay: Duration::from_millis(2000)
            }),
            "reconnect attempt 2 in 2000 ms"
        );
        assert_eq!(
            describe_event(&ChannelEvent::Disconnected { intentional: false }),
            "disconnected (connection lost)"
        );
    }

    #[test]
    fn describes_frames_with_excerpt() {
        let frame = WebSocketEvent {
            topic: Topic::Notification,
            data: json!({"text": "x".repeat(500)}),
            timestamp: 0,
        };
        let line = describe_event(&ChannelEvent::Message(frame));
        assert!(line.starts_with("notification {\"text\""));
        assert!(line.ends_with("..."));
        assert!(line.len() < 250);
    }

    #[test]
    fn status_summary_lists_unhealthy() {
        let status: SystemStatus = serde_json::from_value(json!({
            "status": "degraded",
            "version": "2.1.0",
            "uptime_seconds": 93_780,
            "components": {"ml": {"status": "down"}, "db": {"status": "ok"}}
        }))
        .unwrap();
        assert_eq!(
            status_summary(&status),
            "backend degraded v2.1.0, up 1d02h, unhealthy: ml"
        );
    }

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h01m");
    }
}
