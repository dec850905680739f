//! REST client for the MOVA control-panel backend.
//!
//! A thin typed layer over `/api/dashboards`, `/api/plugins` and
//! `/api/system`. Requests are validated locally where the payload shape
//! is known (widget bounds, widget config schemas, DTO field limits);
//! everything else is the backend's business and errors are passed
//! through unchanged.

pub mod api;
pub mod config;
pub mod dashboards;
pub mod plugins;
pub mod system;

pub use api::{ApiClient, ApiEnvelope, ApiError};
pub use config::ApiConfig;
pub use dashboards::DashboardApi;
pub use plugins::PluginApi;
pub use system::SystemApi;
