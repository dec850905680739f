//! Dashboard and widget endpoints (`/api/dashboards`).
//!
//! Writes that carry widget positions or configs are checked against the
//! dashboard's grid and the widget type's schema before the request is
//! issued, so an invalid layout never reaches the backend.

use mova_core::dashboard::{
    CreateDashboard, CreateWidget, Dashboard, DashboardLayout, UpdateDashboard, UpdateWidget,
};
use mova_core::error::CoreError;
use mova_core::types::EntityId;
use mova_core::widget::{JsonMap, Widget};
use serde::Serialize;
use validator::Validate;

use crate::api::{ApiClient, ApiError};

const BASE: &str = "/api/dashboards";

/// Typed client for the dashboard endpoints.
#[derive(Debug, Clone)]
pub struct DashboardApi {
    api: ApiClient,
}

#[derive(Serialize)]
struct DuplicateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl DashboardApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    // ---------------------------------------------------------------------
    // Dashboards
    // ---------------------------------------------------------------------

    pub async fn list(&self) -> Result<Vec<Dashboard>, ApiError> {
        self.api
            .get(BASE)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to list dashboards"))
    }

    pub async fn get(&self, id: &str) -> Result<Dashboard, ApiError> {
        self.api
            .get(&dashboard_path(id))
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %id, error = %e, "Failed to fetch dashboard"))
    }

    /// Create a dashboard.
    ///
    /// A new dashboard has no widgets yet, so a supplied layout may set the
    /// grid and theme but must not place any widgets; add them with
    /// [`add_widget`](Self::add_widget) afterwards.
    pub async fn create(&self, input: &CreateDashboard) -> Result<Dashboard, ApiError> {
        input.validate().map_err(CoreError::from)?;
        if let Some(layout) = &input.layout {
            check_new_layout(layout)?;
        }
        let dashboard: Dashboard = self
            .api
            .post(BASE, input)
            .await
            .inspect_err(|e| tracing::error!(name = %input.name, error = %e, "Failed to create dashboard"))?;
        tracing::info!(dashboard_id = %dashboard.id, name = %dashboard.name, "Dashboard created");
        Ok(dashboard)
    }

    pub async fn update(&self, id: &str, input: &UpdateDashboard) -> Result<Dashboard, ApiError> {
        input.validate().map_err(CoreError::from)?;
        self.api
            .put(&dashboard_path(id), input)
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %id, error = %e, "Failed to update dashboard"))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&dashboard_path(id))
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %id, error = %e, "Failed to delete dashboard"))?;
        tracing::info!(dashboard_id = %id, "Dashboard deleted");
        Ok(())
    }

    /// Server-side copy of a dashboard, optionally under a new name.
    pub async fn duplicate(&self, id: &str, name: Option<&str>) -> Result<Dashboard, ApiError> {
        self.api
            .post(
                &format!("{}/duplicate", dashboard_path(id)),
                &DuplicateRequest { name },
            )
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %id, error = %e, "Failed to duplicate dashboard"))
    }

    /// Delete dashboards one by one, in order.
    ///
    /// Not atomic: stops at the first failure and returns it. Dashboards
    /// deleted before the failure stay deleted.
    pub async fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<(), ApiError> {
        for (index, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            if let Err(e) = self.delete(id).await {
                tracing::warn!(
                    dashboard_id = %id,
                    deleted = index,
                    remaining = ids.len() - index,
                    "Batch delete stopped",
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Persist the dashboard's current layout.
    ///
    /// The widget list and layout entries must be consistent; every
    /// violation is reported in the validation error.
    pub async fn save_layout(&self, dashboard: &Dashboard) -> Result<Dashboard, ApiError> {
        let issues = dashboard.check_consistency();
        if !issues.is_empty() {
            let detail: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(CoreError::Validation(format!(
                "Inconsistent layout for dashboard {}: {}",
                dashboard.id,
                detail.join("; ")
            ))
            .into());
        }
        self.api
            .put(&format!("{}/layout", dashboard_path(&dashboard.id)), &dashboard.layout)
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %dashboard.id, error = %e, "Failed to save layout"))
    }

    // ---------------------------------------------------------------------
    // Widgets
    // ---------------------------------------------------------------------

    /// Add a widget after checking it against `dashboard`'s grid.
    pub async fn add_widget(&self, dashboard: &Dashboard, input: &CreateWidget) -> Result<Widget, ApiError> {
        input.check(&dashboard.layout.grid)?;
        let widget: Widget = self
            .api
            .post(&widgets_path(&dashboard.id), input)
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %dashboard.id, error = %e, "Failed to add widget"))?;
        tracing::info!(dashboard_id = %dashboard.id, widget_id = %widget.id, widget_type = %widget.widget_type, "Widget added");
        Ok(widget)
    }

    /// Update a widget of `dashboard`, checking the changed position and
    /// config against the grid and the widget's type.
    pub async fn update_widget(
        &self,
        dashboard: &Dashboard,
        widget_id: &str,
        input: &UpdateWidget,
    ) -> Result<Widget, ApiError> {
        let widget = dashboard.widget(widget_id).ok_or_else(|| CoreError::NotFound {
            entity: "widget",
            id: widget_id.to_string(),
        })?;
        input.check(widget.widget_type, &dashboard.layout.grid)?;
        self.api
            .put(&widget_path(&dashboard.id, widget_id), input)
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %dashboard.id, widget_id = %widget_id, error = %e, "Failed to update widget"))
    }

    pub async fn remove_widget(&self, dashboard_id: &str, widget_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&widget_path(dashboard_id, widget_id))
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %dashboard_id, widget_id = %widget_id, error = %e, "Failed to remove widget"))
    }

    /// Fetch a widget's runtime data and store it in `widget.data`.
    pub async fn fetch_widget_data(&self, dashboard_id: &str, widget: &mut Widget) -> Result<(), ApiError> {
        let data: JsonMap = self
            .api
            .get(&format!("{}/data", widget_path(dashboard_id, &widget.id)))
            .await
            .inspect_err(|e| tracing::error!(dashboard_id = %dashboard_id, widget_id = %widget.id, error = %e, "Failed to fetch widget data"))?;
        widget.data = Some(data);
        Ok(())
    }

    /// Refresh the data of every widget on `dashboard`, one at a time.
    ///
    /// A failed widget keeps its previous (possibly stale) data; the
    /// failures are returned with the id of the widget they belong to.
    pub async fn refresh_all_widget_data(&self, dashboard: &mut Dashboard) -> Vec<(EntityId, ApiError)> {
        let mut failures = Vec::new();
        for widget in &mut dashboard.widgets {
            if let Err(e) = self.fetch_widget_data(&dashboard.id, widget).await {
                failures.push((widget.id.clone(), e));
            }
        }
        tracing::debug!(
            dashboard_id = %dashboard.id,
            widgets = dashboard.widgets.len(),
            failed = failures.len(),
            "Widget data refreshed",
        );
        failures
    }
}

// ---- private helpers ----

fn dashboard_path(id: &str) -> String {
    format!("{BASE}/{id}")
}

fn widgets_path(dashboard_id: &str) -> String {
    format!("{BASE}/{dashboard_id}/widgets")
}

fn widget_path(dashboard_id: &str, widget_id: &str) -> String {
    format!("{BASE}/{dashboard_id}/widgets/{widget_id}")
}

/// Every layout entry on a dashboard without widgets is an orphan.
fn check_new_layout(layout: &DashboardLayout) -> Result<(), CoreError> {
    if layout.widgets.is_empty() {
        return Ok(());
    }
    let ids: Vec<&str> = layout.widgets.iter().map(|item| item.id.as_str()).collect();
    Err(CoreError::Validation(format!(
        "A new dashboard has no widgets, but its layout places: {}",
        ids.join(", ")
    )))
}
