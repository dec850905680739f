//! The monitor run loop.
//!
//! Prints the backend's system status once, then connects to the
//! realtime endpoint and logs every lifecycle change and inbound frame
//! until the shutdown future resolves or reconnecting is abandoned.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use mova_client::{ApiClient, ApiConfig, SystemApi};
use mova_core::config::ConfigError;
use mova_realtime::{
    Channel, ChannelEvent, ConnectionBinding, RealtimeConfig, Topic, TopicCache, WebSocketClient,
};
use tokio::sync::Notify;

use crate::report::{cache_summary, describe_event, status_summary};

/// Everything the monitor needs, loaded from the environment.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub realtime: RealtimeConfig,
    pub api: ApiConfig,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            realtime: RealtimeConfig::from_env()?,
            api: ApiConfig::from_env()?,
        })
    }
}

/// Run until `shutdown` resolves.
///
/// Returns an error if the realtime client gives up reconnecting. A
/// failing status request is logged and does not stop the monitor.
pub async fn run<F>(config: MonitorConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tracing::info!(
        ws_url = %config.realtime.url,
        api_url = %config.api.base_url,
        heartbeat_ms = config.realtime.heartbeat_interval.as_millis() as u64,
        max_reconnect_attempts = config.realtime.reconnect.max_attempts,
        "Starting mova-monitor",
    );

    let api = ApiClient::new(&config.api).context("Failed to build HTTP client")?;
    match SystemApi::new(api).status().await {
        Ok(status) => tracing::info!("{}", status_summary(&status)),
        Err(e) => tracing::warn!(error = %e, "System status unavailable"),
    }

    let client = WebSocketClient::new(config.realtime);
    let gave_up = Arc::new(Notify::new());

    for channel in [
        Channel::Connected,
        Channel::Disconnected,
        Channel::Error,
        Channel::Reconnecting,
    ] {
        client.subscribe(channel, |event| {
            tracing::info!(channel = %event.channel(), "{}", describe_event(event));
        });
    }

    let notify = Arc::clone(&gave_up);
    client.subscribe(Channel::ReconnectFailed, move |event| {
        tracing::error!("{}", describe_event(event));
        notify.notify_one();
    });

    client.subscribe(Channel::Message, |event| {
        if let ChannelEvent::Message(frame) = event {
            if frame.topic == Topic::Heartbeat {
                tracing::trace!("server heartbeat");
            } else {
                tracing::info!(topic = %frame.topic, timestamp = frame.timestamp, "{}", describe_event(event));
            }
        }
    });

    let cache = TopicCache::new(&client, Topic::CATALOG);
    let binding = ConnectionBinding::attach(&client, true);

    let outcome = tokio::select! {
        _ = shutdown => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
        _ = gave_up.notified() => {
            let attempts = client.config().reconnect.max_attempts;
            Err(anyhow::anyhow!(
                "Realtime connection could not be restored after {attempts} attempts"
            ))
        }
    };

    for line in cache_summary(&cache) {
        tracing::info!(latest = %line, "Topic seen");
    }
    if let Some(error) = binding.last_error() {
        tracing::debug!(error = %error, "Last realtime error");
    }

    drop(binding);
    drop(cache);
    client.shutdown().await;
    outcome
}
