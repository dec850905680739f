//! System endpoints (`/api/system`).

use mova_core::system::{HealthReport, SystemMetrics, SystemStatus};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct SystemApi {
    api: ApiClient,
}

impl SystemApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn status(&self) -> Result<SystemStatus, ApiError> {
        self.api
            .get("/api/system/status")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch system status"))
    }

    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        self.api
            .get("/api/system/health")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch system health"))
    }

    pub async fn metrics(&self) -> Result<SystemMetrics, ApiError> {
        self.api
            .get("/api/system/metrics")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch system metrics"))
    }
}
