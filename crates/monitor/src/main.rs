//! `mova-monitor` -- realtime event monitor for the MOVA control panel.
//!
//! Prints the backend's system status, then connects to the realtime
//! WebSocket endpoint and logs every frame and connection change until
//! Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                      | Default                      |
//! |-------------------------------|------------------------------|
//! | `MOVA_HOST`                   | `localhost:8000`             |
//! | `MOVA_SECURE`                 | `false`                      |
//! | `MOVA_WS_URL`                 | derived from `MOVA_HOST`     |
//! | `MOVA_WS_PATH`                | `/ws`                        |
//! | `MOVA_API_URL`                | derived from `MOVA_HOST`     |
//! | `MOVA_API_TOKEN`              | unset                        |
//! | `MOVA_API_TIMEOUT_SECS`       | `30`                         |
//! | `MOVA_HEARTBEAT_INTERVAL_MS`  | `30000`                      |
//! | `MOVA_RECONNECT_INTERVAL_MS`  | `1000`                       |
//! | `MOVA_MAX_RECONNECT_ATTEMPTS` | `5`                          |
//! | `MOVA_MAX_RECONNECT_DELAY_MS` | `60000`                      |
//! | `MOVA_LOG_FORMAT`             | `text` (`json` for JSON lines) |
//! | `RUST_LOG`                    | `mova_monitor=info,mova_realtime=info,mova_client=info` |

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mova_monitor::MonitorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mova_monitor=info,mova_realtime=info,mova_client=info".into());
    let json = std::env::var("MOVA_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = MonitorConfig::from_env().context("Invalid configuration")?;

    mova_monitor::run(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await
}
