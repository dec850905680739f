//! Shared domain types for the MOVA control panel clients.
//!
//! - [`dashboard`]: dashboards, grid geometry, layout consistency and the
//!   create/update DTOs sent to the backend.
//! - [`widget`]: widget types, grid positions and per-type config schemas.
//! - [`plugin`] / [`system`]: DTOs for the plugin and system endpoints.
//! - [`channels`]: well-known realtime channel names.
//! - [`config`]: environment-variable helpers shared by client configs.

pub mod channels;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod plugin;
pub mod system;
pub mod types;
pub mod widget;
