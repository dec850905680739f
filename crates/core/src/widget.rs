//! Widget types, grid positions and per-type configuration schemas.
//!
//! A widget's `config` is a free-form JSON object on the wire. Each
//! [`WidgetType`] declares the keys it requires and a default config so
//! that the builder can seed new widgets and reject incomplete edits
//! before they reach the backend.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::CoreError;
use crate::types::EntityId;

/// Free-form JSON object used for widget config and runtime data.
pub type JsonMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// Widget type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Metric,
    Chart,
    Table,
    Text,
    Image,
    Custom,
}

impl WidgetType {
    /// All widget types in builder palette order.
    pub const ALL: [WidgetType; 6] = [
        WidgetType::Metric,
        WidgetType::Chart,
        WidgetType::Table,
        WidgetType::Text,
        WidgetType::Image,
        WidgetType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Metric => "metric",
            WidgetType::Chart => "chart",
            WidgetType::Table => "table",
            WidgetType::Text => "text",
            WidgetType::Image => "image",
            WidgetType::Custom => "custom",
        }
    }

    /// Config keys that must be present for this widget type.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            WidgetType::Metric => &["metric"],
            WidgetType::Chart => &["chart_type", "data_source"],
            WidgetType::Table => &["data_source", "columns"],
            WidgetType::Text => &["content"],
            WidgetType::Image => &["url"],
            WidgetType::Custom => &[],
        }
    }

    /// Starting config for a freshly placed widget.
    ///
    /// Required keys are present but may hold empty placeholders that the
    /// config panel is expected to fill in.
    pub fn default_config(&self) -> JsonMap {
        let value = match self {
            WidgetType::Metric => json!({ "metric": "", "unit": "", "refresh_interval": 30 }),
            WidgetType::Chart => json!({ "chart_type": "line", "data_source": "" }),
            WidgetType::Table => json!({ "data_source": "", "columns": [] }),
            WidgetType::Text => json!({ "content": "" }),
            WidgetType::Image => json!({ "url": "" }),
            WidgetType::Custom => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        }
    }

    /// Default size in grid cells as `(width, height)`.
    pub fn default_size(&self) -> (u32, u32) {
        match self {
            WidgetType::Metric => (3, 2),
            WidgetType::Chart => (6, 4),
            WidgetType::Table => (6, 4),
            WidgetType::Text => (4, 2),
            WidgetType::Image => (4, 3),
            WidgetType::Custom => (4, 3),
        }
    }
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Placement of a widget in grid cells. `(x, y)` is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl WidgetPosition {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// First column to the right of the widget.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// First row below the widget.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &WidgetPosition) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
    #[serde(default)]
    pub config: JsonMap,
    /// Runtime data bound by the backend. `None` until fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonMap>,
    pub position: WidgetPosition,
}

impl Widget {
    /// Build a widget with a fresh client-side id and the type's default config.
    pub fn new(widget_type: WidgetType, title: impl Into<String>, position: WidgetPosition) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            widget_type,
            title: title.into(),
            config: widget_type.default_config(),
            data: None,
            position,
        }
    }

    pub fn with_config(mut self, config: JsonMap) -> Self {
        self.config = config;
        self
    }
}

// ---------------------------------------------------------------------------
// Config validation
// ---------------------------------------------------------------------------

/// Chart renderers understood by the dashboard UI.
pub const VALID_CHART_TYPES: &[&str] = &["line", "bar", "area", "pie"];

/// Validate a widget config against the schema for `widget_type`.
///
/// Checks that every required key is present with the expected JSON type.
/// `refresh_interval` is optional for every type but must be a positive
/// integer when given.
pub fn validate_config(widget_type: WidgetType, config: &JsonMap) -> Result<(), CoreError> {
    for key in widget_type.required_keys() {
        if !config.contains_key(*key) {
            return Err(CoreError::Validation(format!(
                "{widget_type} widget config is missing required key '{key}'"
            )));
        }
    }

    match widget_type {
        WidgetType::Metric => {
            require_string(widget_type, config, "metric")?;
            if let Some(unit) = config.get("unit") {
                if !unit.is_string() {
                    return Err(CoreError::Validation(
                        "metric widget 'unit' must be a string".to_string(),
                    ));
                }
            }
        }
        WidgetType::Chart => {
            let chart_type = require_string(widget_type, config, "chart_type")?;
            if !VALID_CHART_TYPES.contains(&chart_type) {
                return Err(CoreError::Validation(format!(
                    "Invalid chart_type '{chart_type}'. Must be one of: {}",
                    VALID_CHART_TYPES.join(", ")
                )));
            }
            require_string(widget_type, config, "data_source")?;
        }
        WidgetType::Table => {
            require_string(widget_type, config, "data_source")?;
            let columns = config
                .get("columns")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    CoreError::Validation("table widget 'columns' must be an array".to_string())
                })?;
            if columns.is_empty() {
                return Err(CoreError::Validation(
                    "table widget needs at least one column".to_string(),
                ));
            }
            if let Some(i) = columns.iter().position(|c| !c.is_string()) {
                return Err(CoreError::Validation(format!(
                    "table widget columns[{i}] must be a string"
                )));
            }
        }
        WidgetType::Text => {
            require_string(widget_type, config, "content")?;
        }
        WidgetType::Image => {
            require_string(widget_type, config, "url")?;
        }
        WidgetType::Custom => {}
    }

    if let Some(interval) = config.get("refresh_interval") {
        match interval.as_u64() {
            Some(secs) if secs >= 1 => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "refresh_interval must be a positive integer, got {interval}"
                )));
            }
        }
    }

    Ok(())
}

fn require_string<'a>(
    widget_type: WidgetType,
    config: &'a JsonMap,
    key: &str,
) -> Result<&'a str, CoreError> {
    config.get(key).and_then(Value::as_str).ok_or_else(|| {
        CoreError::Validation(format!("{widget_type} widget '{key}' must be a string"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn widget_type_serializes_snake_case() {
        assert_eq!(serde_json::to_value(WidgetType::Metric).unwrap(), "metric");
        let t: WidgetType = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(t, WidgetType::Custom);
    }

    #[test]
    fn default_configs_carry_required_keys() {
        for t in WidgetType::ALL {
            let config = t.default_config();
            for key in t.required_keys() {
                assert!(config.contains_key(*key), "{t} default lacks {key}");
            }
        }
    }

    #[test]
    fn widget_json_uses_type_field() {
        let widget = Widget::new(WidgetType::Text, "Notes", WidgetPosition::new(0, 0, 2, 1));
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("data").is_none());
        assert_eq!(json["position"]["width"], 2);
    }

    #[test]
    fn widget_without_data_deserializes() {
        let json = r#"{"id":"w1","type":"metric","title":"CPU","config":{"metric":"cpu"},
                       "position":{"x":0,"y":0,"width":3,"height":2}}"#;
        let widget: Widget = serde_json::from_str(json).unwrap();
        assert!(widget.data.is_none());
        assert_eq!(widget.position.right(), 3);
    }

    #[test]
    fn overlap_detection() {
        let a = WidgetPosition::new(0, 0, 4, 2);
        assert!(a.overlaps(&WidgetPosition::new(3, 1, 2, 2)));
        assert!(!a.overlaps(&WidgetPosition::new(4, 0, 2, 2)));
        assert!(!a.overlaps(&WidgetPosition::new(0, 2, 4, 1)));
    }

    #[test]
    fn metric_config_requires_metric_string() {
        assert!(validate_config(WidgetType::Metric, &map(json!({"metric": "cpu"}))).is_ok());
        assert!(validate_config(WidgetType::Metric, &map(json!({}))).is_err());
        assert!(validate_config(WidgetType::Metric, &map(json!({"metric": 5}))).is_err());
        assert!(validate_config(WidgetType::Metric, &map(json!({"metric": "cpu", "unit": 1}))).is_err());
    }

    #[test]
    fn chart_type_must_be_known() {
        let ok = map(json!({"chart_type": "bar", "data_source": "jobs"}));
        assert!(validate_config(WidgetType::Chart, &ok).is_ok());

        let bad = map(json!({"chart_type": "radar", "data_source": "jobs"}));
        let err = validate_config(WidgetType::Chart, &bad).unwrap_err();
        assert!(err.to_string().contains("radar"));
    }

    #[test]
    fn table_columns_must_be_non_empty_strings() {
        let ok = map(json!({"data_source": "files", "columns": ["name", "size"]}));
        assert!(validate_config(WidgetType::Table, &ok).is_ok());
        assert!(validate_config(WidgetType::Table, &map(json!({"data_source": "f", "columns": []}))).is_err());
        assert!(validate_config(WidgetType::Table, &map(json!({"data_source": "f", "columns": [1]}))).is_err());
        assert!(validate_config(WidgetType::Table, &map(json!({"data_source": "f", "columns": "a"}))).is_err());
    }

    #[test]
    fn refresh_interval_must_be_positive() {
        let zero = map(json!({"content": "hi", "refresh_interval": 0}));
        assert!(validate_config(WidgetType::Text, &zero).is_err());
        let neg = map(json!({"content": "hi", "refresh_interval": -5}));
        assert!(validate_config(WidgetType::Text, &neg).is_err());
        let ok = map(json!({"content": "hi", "refresh_interval": 15}));
        assert!(validate_config(WidgetType::Text, &ok).is_ok());
    }

    #[test]
    fn custom_accepts_anything() {
        assert!(validate_config(WidgetType::Custom, &map(json!({"anything": [1, 2]}))).is_ok());
    }
}
