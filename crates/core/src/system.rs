//! System status DTOs returned by the `/api/system` endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Health of a single backend component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
    #[serde(default)]
    pub components: HashMap<String, ComponentHealth>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl SystemStatus {
    /// Names of components that are not reporting healthy, sorted.
    pub fn unhealthy_components(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .components
            .iter()
            .filter(|(_, health)| !health.is_healthy())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Response of the health endpoint: an overall verdict plus per-check detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub checks: HashMap<String, ComponentHealth>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
            && self.checks.values().all(ComponentHealth::is_healthy)
    }
}

/// Point-in-time resource usage snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub active_connections: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}
