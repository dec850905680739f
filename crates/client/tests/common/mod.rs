//! Mock MOVA backend for REST client integration tests.
//!
//! Routes are registered per test as canned `(status, body)` responses
//! keyed by method and path; every request is recorded for assertions.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use mova_client::{ApiClient, ApiConfig};

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Routes = HashMap<(String, String), (u16, Value)>;

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Answer `method path` with `status` and a JSON `body`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    /// Answer `method path` with 200 and `{"success": true, "data": data}`.
    pub fn ok(&self, method: &str, path: &str, data: Value) {
        self.respond(method, path, 200, json!({"success": true, "data": data}));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `"METHOD /path"` for every recorded request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&self.base_url)).unwrap()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let route = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), path))
        .cloned();
    match route {
        Some((204, _)) => StatusCode::NO_CONTENT.into_response(),
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "no such route"})),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const NOW: &str = "2024-05-01T12:00:00Z";

pub fn widget_json(id: &str, kind: &str, x: u32, y: u32, width: u32, height: u32) -> Value {
    let config = match kind {
        "metric" => json!({"metric": "cpu"}),
        "text" => json!({"content": "hello"}),
        _ => json!({}),
    };
    json!({
        "id": id,
        "type": kind,
        "title": format!("{kind} {id}"),
        "config": config,
        "position": {"x": x, "y": y, "width": width, "height": height}
    })
}

/// A dashboard whose layout mirrors its widgets exactly.
pub fn dashboard_json(id: &str, widgets: Vec<Value>) -> Value {
    let layout: Vec<Value> = widgets
        .iter()
        .map(|w| {
            let p = &w["position"];
            json!({"id": w["id"], "x": p["x"], "y": p["y"], "width": p["width"], "height": p["height"]})
        })
        .collect();
    json!({
        "id": id,
        "name": format!("Dashboard {id}"),
        "description": null,
        "user_id": "u1",
        "widgets": widgets,
        "layout": {
            "grid": {"columns": 12, "rows": 8, "cell_width": 100, "cell_height": 80, "gap": 10},
            "theme": "dark",
            "widgets": layout
        },
        "is_public": false,
        "created_at": NOW,
        "updated_at": NOW
    })
}

pub fn plugin_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": "Log Viewer",
        "version": "1.2.0",
        "enabled": status == "enabled",
        "status": status,
        "config": {},
        "created_at": NOW,
        "updated_at": NOW
    })
}
