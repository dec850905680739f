use std::time::Duration;

use mova_core::config::{base_url, flag_var, parse_var, string_var, ConfigError, DEFAULT_HOST};

use crate::reconnect::ReconnectConfig;

/// Realtime client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeConfig {
    /// Full WebSocket URL, e.g. `ws://localhost:8000/ws`.
    pub url: String,
    /// Interval between keep-alive frames while connected.
    pub heartbeat_interval: Duration,
    /// Reconnect backoff policy.
    pub reconnect: ReconnectConfig,
}

impl RealtimeConfig {
    /// Config for `url` with default heartbeat and reconnect settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                          |
    /// |-------------------------------|----------------------------------|
    /// | `MOVA_WS_URL`                 | `{ws,wss}://{MOVA_HOST}{MOVA_WS_PATH}` |
    /// | `MOVA_HOST`                   | `localhost:8000`                 |
    /// | `MOVA_SECURE`                 | `false`                          |
    /// | `MOVA_WS_PATH`                | `/ws`                            |
    /// | `MOVA_HEARTBEAT_INTERVAL_MS`  | `30000`                          |
    /// | `MOVA_RECONNECT_INTERVAL_MS`  | `1000`                           |
    /// | `MOVA_MAX_RECONNECT_ATTEMPTS` | `5`                              |
    /// | `MOVA_MAX_RECONNECT_DELAY_MS` | `60000`                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let url = match string_var(&lookup, "MOVA_WS_URL") {
            Some(url) => url,
            None => {
                let host = string_var(&lookup, "MOVA_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
                let secure = flag_var(&lookup, "MOVA_SECURE", false)?;
                let path = string_var(&lookup, "MOVA_WS_PATH").unwrap_or_else(|| "/ws".into());
                let path = if path.starts_with('/') {
                    path
                } else {
                    format!("/{path}")
                };
                format!("{}{path}", base_url(&host, secure, true))
            }
        };

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ConfigError::Invalid {
                var: "MOVA_WS_URL",
                value: url,
                reason: "must start with ws:// or wss://".to_string(),
            });
        }

        let heartbeat_ms: u64 = parse_var(&lookup, "MOVA_HEARTBEAT_INTERVAL_MS", 30_000)?;
        let reconnect_ms: u64 = parse_var(&lookup, "MOVA_RECONNECT_INTERVAL_MS", 1_000)?;
        let max_attempts: u32 = parse_var(&lookup, "MOVA_MAX_RECONNECT_ATTEMPTS", 5)?;
        let max_delay_ms: u64 = parse_var(&lookup, "MOVA_MAX_RECONNECT_DELAY_MS", 60_000)?;

        if heartbeat_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "MOVA_HEARTBEAT_INTERVAL_MS",
                value: "0".into(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            url,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_millis(reconnect_ms),
                max_delay: Duration::from_millis(max_delay_ms),
                max_attempts,
                ..ReconnectConfig::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RealtimeConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RealtimeConfig::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn defaults_derive_url_from_host() {
        let config = load(&[]).unwrap();
        assert_eq!(config.url, "ws://localhost:8000/ws");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.reconnect.initial_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn secure_host_uses_wss() {
        let config = load(&[("MOVA_HOST", "mova.example.com"), ("MOVA_SECURE", "true"), ("MOVA_WS_PATH", "realtime")]).unwrap();
        assert_eq!(config.url, "wss://mova.example.com/realtime");
    }

    #[test]
    fn explicit_url_wins() {
        let config = load(&[("MOVA_WS_URL", "ws://10.0.0.5:9000/events"), ("MOVA_HOST", "ignored")]).unwrap();
        assert_eq!(config.url, "ws://10.0.0.5:9000/events");
    }

    #[test]
    fn rejects_http_url_and_zero_heartbeat() {
        assert!(load(&[("MOVA_WS_URL", "http://host/ws")]).is_err());
        assert!(load(&[("MOVA_HEARTBEAT_INTERVAL_MS", "0")]).is_err());
        assert!(load(&[("MOVA_MAX_RECONNECT_ATTEMPTS", "many")]).is_err());
    }
}
