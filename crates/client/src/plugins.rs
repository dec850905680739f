//! Plugin endpoints (`/api/plugins`).

use mova_core::error::CoreError;
use mova_core::plugin::{InstallPlugin, Plugin};
use mova_core::widget::JsonMap;
use validator::Validate;

use crate::api::{ApiClient, ApiError};

const BASE: &str = "/api/plugins";

#[derive(Debug, Clone)]
pub struct PluginApi {
    api: ApiClient,
}

impl PluginApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Plugin>, ApiError> {
        self.api
            .get(BASE)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to list plugins"))
    }

    pub async fn get(&self, id: &str) -> Result<Plugin, ApiError> {
        self.api
            .get(&plugin_path(id))
            .await
            .inspect_err(|e| tracing::error!(plugin_id = %id, error = %e, "Failed to fetch plugin"))
    }

    pub async fn install(&self, input: &InstallPlugin) -> Result<Plugin, ApiError> {
        input.validate().map_err(CoreError::from)?;
        let plugin: Plugin = self
            .api
            .post(&format!("{BASE}/install"), input)
            .await
            .inspect_err(|e| tracing::error!(source = %input.source, error = %e, "Failed to install plugin"))?;
        tracing::info!(plugin_id = %plugin.id, version = %plugin.version, "Plugin installed");
        Ok(plugin)
    }

    pub async fn uninstall(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&plugin_path(id))
            .await
            .inspect_err(|e| tracing::error!(plugin_id = %id, error = %e, "Failed to uninstall plugin"))?;
        tracing::info!(plugin_id = %id, "Plugin uninstalled");
        Ok(())
    }

    pub async fn enable(&self, id: &str) -> Result<Plugin, ApiError> {
        self.toggle(id, "enable").await
    }

    pub async fn disable(&self, id: &str) -> Result<Plugin, ApiError> {
        self.toggle(id, "disable").await
    }

    /// Replace the plugin's config map.
    pub async fn update_config(&self, id: &str, config: &JsonMap) -> Result<Plugin, ApiError> {
        self.api
            .put(&format!("{}/config", plugin_path(id)), config)
            .await
            .inspect_err(|e| tracing::error!(plugin_id = %id, error = %e, "Failed to update plugin config"))
    }

    // ---- private helpers ----

    async fn toggle(&self, id: &str, action: &'static str) -> Result<Plugin, ApiError> {
        self.api
            .post_empty(&format!("{}/{action}", plugin_path(id)))
            .await
            .inspect_err(|e| tracing::error!(plugin_id = %id, action, error = %e, "Plugin state change failed"))
    }
}

fn plugin_path(id: &str) -> String {
    format!("{BASE}/{id}")
}
