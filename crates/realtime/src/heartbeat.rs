//! Client keep-alive frames.
//!
//! While a connection is open the session sends a `heartbeat` envelope
//! every `heartbeat_interval` so that proxies and load balancers do not
//! idle the socket out. No reply is expected.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::messages::{Topic, WebSocketEvent};

/// Ticker for one session. The first tick fires one full `period` after
/// the connection opens, not immediately.
pub fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// The keep-alive envelope.
pub fn heartbeat_frame() -> WebSocketEvent {
    WebSocketEvent::new(Topic::Heartbeat, serde_json::json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_heartbeat_topic() {
        let frame = heartbeat_frame();
        assert_eq!(frame.topic, Topic::Heartbeat);
        assert!(frame.data.is_object());
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_a_full_period() {
        let start = Instant::now();
        let mut t = ticker(Duration::from_secs(30));
        t.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        t.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }
}
