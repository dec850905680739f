use std::time::Duration;

use mova_core::config::{base_url, flag_var, parse_var, string_var, ConfigError, DEFAULT_HOST};

/// REST client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Backend base URL without a trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Bearer token attached to every request, if any.
    pub token: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                              |
    /// |-------------------------|--------------------------------------|
    /// | `MOVA_API_URL`          | `{http,https}://{MOVA_HOST}`         |
    /// | `MOVA_HOST`             | `localhost:8000`                     |
    /// | `MOVA_SECURE`           | `false`                              |
    /// | `MOVA_API_TOKEN`        | unset                                |
    /// | `MOVA_API_TIMEOUT_SECS` | `30`                                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let base_url = match string_var(&lookup, "MOVA_API_URL") {
            Some(url) => url,
            None => {
                let host = string_var(&lookup, "MOVA_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
                let secure = flag_var(&lookup, "MOVA_SECURE", false)?;
                base_url(&host, secure, false)
            }
        };

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "MOVA_API_URL",
                value: base_url,
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let timeout_secs: u64 = parse_var(&lookup, "MOVA_API_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "MOVA_API_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: string_var(&lookup, "MOVA_API_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
