//! Dashboard model, grid geometry and layout consistency.
//!
//! A [`Dashboard`] keeps its widgets in two places: the ordered `widgets`
//! list and the `layout.widgets` position list. Every widget must have a
//! layout entry with the same id and the same position. The mutation
//! helpers on [`Dashboard`] keep both lists in step and validate bounds
//! against the [`GridConfig`] before changing anything.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};
use crate::widget::{validate_config, JsonMap, Widget, WidgetPosition, WidgetType};

// ---------------------------------------------------------------------------
// Grid and theme
// ---------------------------------------------------------------------------

/// Coordinate space widgets are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
    /// Gap between cells in pixels.
    #[serde(default)]
    pub gap: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 8,
            cell_width: 100,
            cell_height: 80,
            gap: 10,
        }
    }
}

impl GridConfig {
    /// Returns `true` if the position has a non-zero size and lies fully
    /// inside the grid.
    pub fn fits(&self, position: &WidgetPosition) -> bool {
        position.width >= 1
            && position.height >= 1
            && position.right() <= self.columns
            && position.bottom() <= self.rows
    }

    /// Validate a widget position against this grid.
    pub fn validate_position(&self, position: &WidgetPosition) -> Result<(), CoreError> {
        if position.width < 1 || position.height < 1 {
            return Err(CoreError::Validation(format!(
                "Widget size must be at least 1x1, got {}x{}",
                position.width, position.height
            )));
        }
        if position.right() > self.columns {
            return Err(CoreError::Validation(format!(
                "Widget spans columns {}..{} but the grid has {} columns",
                position.x,
                position.right(),
                self.columns
            )));
        }
        if position.bottom() > self.rows {
            return Err(CoreError::Validation(format!(
                "Widget spans rows {}..{} but the grid has {} rows",
                position.y,
                position.bottom(),
                self.rows
            )));
        }
        Ok(())
    }

    /// Pixel size of a widget as `(width, height)`, gaps included.
    pub fn pixel_size(&self, position: &WidgetPosition) -> (u32, u32) {
        let span = |cells: u32, cell: u32| {
            cells
                .saturating_mul(cell)
                .saturating_add(cells.saturating_sub(1).saturating_mul(self.gap))
        };
        (
            span(position.width, self.cell_width),
            span(position.height, self.cell_height),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A widget's entry in the layout position list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub id: EntityId,
    #[serde(flatten)]
    pub position: WidgetPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub widgets: Vec<LayoutItem>,
}

impl DashboardLayout {
    pub fn item(&self, widget_id: &str) -> Option<&LayoutItem> {
        self.widgets.iter().find(|item| item.id == widget_id)
    }
}

/// A single violation reported by [`Dashboard::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    /// A widget has no entry in `layout.widgets`.
    MissingLayoutEntry(EntityId),
    /// A layout entry refers to a widget that does not exist.
    OrphanLayoutEntry(EntityId),
    /// The same widget id appears more than once.
    DuplicateWidget(EntityId),
    /// The widget's own position disagrees with its layout entry.
    PositionMismatch(EntityId),
    /// The widget does not fit inside the grid.
    OutOfBounds(EntityId),
}

impl std::fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutIssue::MissingLayoutEntry(id) => write!(f, "widget {id} has no layout entry"),
            LayoutIssue::OrphanLayoutEntry(id) => write!(f, "layout entry {id} has no widget"),
            LayoutIssue::DuplicateWidget(id) => write!(f, "widget {id} appears more than once"),
            LayoutIssue::PositionMismatch(id) => {
                write!(f, "widget {id} position differs from its layout entry")
            }
            LayoutIssue::OutOfBounds(id) => write!(f, "widget {id} does not fit the grid"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub user_id: EntityId,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub layout: DashboardLayout,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dashboard {
    pub fn widget(&self, widget_id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == widget_id)
    }

    /// Place a new widget on the dashboard.
    ///
    /// Fails if the id is already taken, the position does not fit the
    /// grid, or the config does not satisfy the widget type's schema.
    pub fn add_widget(&mut self, widget: Widget) -> Result<(), CoreError> {
        if self.widget(&widget.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Widget {} already exists on dashboard {}",
                widget.id, self.id
            )));
        }
        self.layout.grid.validate_position(&widget.position)?;
        validate_config(widget.widget_type, &widget.config)?;

        self.layout.widgets.push(LayoutItem {
            id: widget.id.clone(),
            position: widget.position,
        });
        self.widgets.push(widget);
        Ok(())
    }

    /// Move a widget's top-left corner, keeping its size.
    pub fn move_widget(&mut self, widget_id: &str, x: u32, y: u32) -> Result<(), CoreError> {
        let current = self.position_of(widget_id)?;
        self.set_position(
            widget_id,
            WidgetPosition::new(x, y, current.width, current.height),
        )
    }

    /// Resize a widget, keeping its top-left corner.
    pub fn resize_widget(
        &mut self,
        widget_id: &str,
        width: u32,
        height: u32,
    ) -> Result<(), CoreError> {
        let current = self.position_of(widget_id)?;
        self.set_position(
            widget_id,
            WidgetPosition::new(current.x, current.y, width, height),
        )
    }

    /// Replace a widget's position in both the widget list and the layout.
    pub fn set_position(
        &mut self,
        widget_id: &str,
        position: WidgetPosition,
    ) -> Result<(), CoreError> {
        self.layout.grid.validate_position(&position)?;

        let widget = self
            .widgets
            .iter_mut()
            .find(|w| w.id == widget_id)
            .ok_or_else(|| widget_not_found(widget_id))?;
        widget.position = position;

        match self.layout.widgets.iter_mut().find(|i| i.id == widget_id) {
            Some(item) => item.position = position,
            None => self.layout.widgets.push(LayoutItem {
                id: widget_id.to_string(),
                position,
            }),
        }
        Ok(())
    }

    /// Replace a widget's config after validating it against its type.
    pub fn update_widget_config(
        &mut self,
        widget_id: &str,
        config: JsonMap,
    ) -> Result<(), CoreError> {
        let widget = self
            .widgets
            .iter_mut()
            .find(|w| w.id == widget_id)
            .ok_or_else(|| widget_not_found(widget_id))?;
        validate_config(widget.widget_type, &config)?;
        widget.config = config;
        Ok(())
    }

    /// Remove a widget and its layout entry, returning the widget.
    pub fn remove_widget(&mut self, widget_id: &str) -> Result<Widget, CoreError> {
        let index = self
            .widgets
            .iter()
            .position(|w| w.id == widget_id)
            .ok_or_else(|| widget_not_found(widget_id))?;
        self.layout.widgets.retain(|item| item.id != widget_id);
        Ok(self.widgets.remove(index))
    }

    /// First free top-left cell (row-major) where a `width` x `height`
    /// widget fits without overlapping any existing widget.
    pub fn next_free_position(&self, width: u32, height: u32) -> Option<WidgetPosition> {
        let grid = self.layout.grid;
        if width == 0 || height == 0 || width > grid.columns || height > grid.rows {
            return None;
        }
        for y in 0..=(grid.rows - height) {
            for x in 0..=(grid.columns - width) {
                let candidate = WidgetPosition::new(x, y, width, height);
                if !self.widgets.iter().any(|w| w.position.overlaps(&candidate)) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Build a widget of `widget_type` at the first free slot of its
    /// default size and add it.
    pub fn place_new_widget(
        &mut self,
        widget_type: WidgetType,
        title: impl Into<String>,
    ) -> Result<&Widget, CoreError> {
        let (width, height) = widget_type.default_size();
        let position = self.next_free_position(width, height).ok_or_else(|| {
            CoreError::Conflict(format!(
                "No free {width}x{height} slot left on dashboard {}",
                self.id
            ))
        })?;
        let widget = Widget::new(widget_type, title, position);
        self.add_widget(widget)?;
        self.widgets
            .last()
            .ok_or_else(|| CoreError::Internal("widget list empty after insert".to_string()))
    }

    /// Report every violation of the widget/layout invariants.
    ///
    /// An empty result means the dashboard is consistent.
    pub fn check_consistency(&self) -> Vec<LayoutIssue> {
        let mut issues = Vec::new();
        let mut seen: Vec<&str> = Vec::with_capacity(self.widgets.len());

        for widget in &self.widgets {
            if seen.contains(&widget.id.as_str()) {
                issues.push(LayoutIssue::DuplicateWidget(widget.id.clone()));
                continue;
            }
            seen.push(&widget.id);

            match self.layout.item(&widget.id) {
                None => issues.push(LayoutIssue::MissingLayoutEntry(widget.id.clone())),
                Some(item) if item.position != widget.position => {
                    issues.push(LayoutIssue::PositionMismatch(widget.id.clone()))
                }
                Some(_) => {}
            }

            if !self.layout.grid.fits(&widget.position) {
                issues.push(LayoutIssue::OutOfBounds(widget.id.clone()));
            }
        }

        for item in &self.layout.widgets {
            if self.widget(&item.id).is_none() {
                issues.push(LayoutIssue::OrphanLayoutEntry(item.id.clone()));
            }
        }

        issues
    }

    /// Rebuild `layout.widgets` from the widget list, dropping orphans
    /// and adopting each widget's own position.
    pub fn sync_layout(&mut self) {
        self.layout.widgets = self
            .widgets
            .iter()
            .map(|w| LayoutItem {
                id: w.id.clone(),
                position: w.position,
            })
            .collect();
    }

    // ---- private helpers ----

    fn position_of(&self, widget_id: &str) -> Result<WidgetPosition, CoreError> {
        self.widget(widget_id)
            .map(|w| w.position)
            .ok_or_else(|| widget_not_found(widget_id))
    }
}

fn widget_not_found(widget_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "widget",
        id: widget_id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDashboard {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<DashboardLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl CreateDashboard {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            layout: None,
            is_public: None,
        }
    }
}

/// DTO for partially updating a dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDashboard {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<DashboardLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// DTO for adding a widget to a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateWidget {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    pub config: JsonMap,
    pub position: WidgetPosition,
}

impl CreateWidget {
    /// Validate the DTO fields, the config schema and the position against `grid`.
    pub fn check(&self, grid: &GridConfig) -> Result<(), CoreError> {
        self.validate()?;
        grid.validate_position(&self.position)?;
        validate_config(self.widget_type, &self.config)
    }
}

/// DTO for partially updating a widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateWidget {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<WidgetPosition>,
}

impl UpdateWidget {
    /// Validate the changed fields against the widget's type and `grid`.
    pub fn check(&self, widget_type: WidgetType, grid: &GridConfig) -> Result<(), CoreError> {
        self.validate()?;
        if let Some(position) = &self.position {
            grid.validate_position(position)?;
        }
        if let Some(config) = &self.config {
            validate_config(widget_type, config)?;
        }
        Ok(())
    }
}
