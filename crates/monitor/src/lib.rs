//! `mova-monitor` library: configuration, the run loop and log formatting
//! for the realtime monitor binary.

pub mod monitor;
pub mod report;

pub use monitor::{run, MonitorConfig};
