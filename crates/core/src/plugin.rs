//! Plugin DTOs exchanged with the `/api/plugins` endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{EntityId, Timestamp};
use crate::widget::JsonMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Installed,
    Enabled,
    Disabled,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: EntityId,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    pub status: PluginStatus,
    #[serde(default)]
    pub config: JsonMap,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for installing a plugin from a package source.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InstallPlugin {
    /// Package name or URL understood by the backend.
    #[validate(length(min = 1, max = 500))]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub config: JsonMap,
}
