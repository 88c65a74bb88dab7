//! HTTP API server for web-app integration.
//!
//! Serves the sync endpoints the web app pushes to, the task-decomposition
//! forwarder, and health probes. Spawned as a background task next to the
//! gateway, or standalone via the `api` subcommand.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use focus_core::config::ApiConfig;
use focus_core::error::FocusError;
use focus_core::traits::Provider;
use focus_providers::decompose;
use focus_providers::lmstudio::LmStudioProvider;
use focus_sync::{SyncDelta, SyncRecord, SyncStore};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "focushelper-api";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    sync: Arc<SyncStore>,
    /// Decomposition backend behind the trait, so tests can inject a mock.
    decomposer: Arc<dyn Provider>,
    /// Concrete handle for the `/lm/health` probe.
    lm: Arc<LmStudioProvider>,
}

impl ApiState {
    pub fn new(sync: Arc<SyncStore>, lm: Arc<LmStudioProvider>) -> Self {
        Self {
            sync,
            decomposer: lm.clone(),
            lm,
        }
    }
}

/// `POST /sync` request body.
#[derive(Debug, Deserialize)]
struct SyncRequest {
    #[serde(rename = "userId")]
    user_id: i64,
    settings: Option<Map<String, Value>>,
    tasks: Option<Vec<Value>>,
    stats: Option<Map<String, Value>>,
}

/// `POST /analyze_task` request body.
#[derive(Debug, Deserialize)]
struct AnalyzeTaskRequest {
    #[serde(rename = "userId")]
    #[allow(dead_code)]
    user_id: i64,
    description: String,
    deadline: Option<String>,
}

fn sync_response(record: SyncRecord, message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "settings": record.settings,
        "tasks": record.tasks,
        "stats": record.stats,
        "message": message,
    }))
}

/// `GET /` — service identity.
async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "service": SERVICE_NAME }))
}

/// `GET /health` — liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `POST /sync` — merge a partial update and return the full record.
async fn sync_push(
    State(state): State<ApiState>,
    body: Result<Json<SyncRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Schema validation happens before any merge logic runs.
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": format!("invalid request: {e}")})),
        )
    })?;

    let delta = SyncDelta {
        settings: request.settings,
        tasks: request.tasks,
        stats: request.stats,
    };

    let record = state.sync.merge(request.user_id, delta).map_err(|e| {
        error!("sync merge failed for user {}: {e}", request.user_id);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": format!("sync failed: {e}")})),
        )
    })?;

    info!("data synchronized for user {}", request.user_id);
    Ok(sync_response(record, "Data synchronized"))
}

/// `GET /sync/{userId}` — read the stored record. Never-seen users get a
/// successful, all-empty response rather than a 404.
async fn sync_read(
    State(state): State<ApiState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let record = state.sync.read(user_id).map_err(|e| {
        error!("sync read failed for user {user_id}: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": format!("read failed: {e}")})),
        )
    })?;

    Ok(sync_response(record, "Data retrieved"))
}

/// `POST /analyze_task` — forward a task description to the LLM backend and
/// return validated subtask estimates.
async fn analyze_task(
    State(state): State<ApiState>,
    body: Result<Json<AnalyzeTaskRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": format!("invalid request: {e}")})),
        )
    })?;

    let messages = decompose::build_prompt(&request.description, request.deadline.as_deref());

    let reply = match state.decomposer.complete(&messages).await {
        Ok(reply) => reply,
        Err(FocusError::ProviderUnavailable(e)) => {
            warn!("analyze_task backend unavailable: {e}");
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "success": false,
                    "message": "model backend unavailable (base URL or tunnel down?)",
                })),
            ));
        }
        Err(e) => {
            error!("analyze_task failed: {e}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": format!("task analysis failed: {e}")})),
            ));
        }
    };

    let mut sub_tasks = decompose::parse_subtasks(&reply);
    if sub_tasks.is_empty() {
        info!("analyze_task: unusable model reply, substituting fallback plan");
        sub_tasks = decompose::fallback_plan();
    }
    let total: u32 = sub_tasks.iter().map(|s| s.estimated_pomodoros).sum();

    Ok(Json(json!({
        "success": true,
        "subTasks": sub_tasks,
        "totalPomodoros": total,
    })))
}

/// `GET /lm/health` — probe the decomposition backend's `/models` endpoint.
async fn lm_health(State(state): State<ApiState>) -> Json<Value> {
    match state.lm.health().await {
        Ok(h) => Json(json!({
            "ok": h.ok,
            "status": h.status,
            "base_url": state.lm.base_url(),
            "wanted_model": state.lm.model(),
            "models": h.models,
        })),
        Err(e) => Json(json!({
            "ok": false,
            "base_url": state.lm.base_url(),
            "error": e.to_string(),
        })),
    }
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/sync", post(sync_push))
        .route("/sync/{user_id}", get(sync_read))
        .route("/analyze_task", post(analyze_task))
        .route("/lm/health", get(lm_health))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// CORS policy from config: `*` allows any caller, anything else pins the
/// single web-app origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origin == "*" {
        return layer.allow_origin(Any);
    }
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("invalid allowed_origin '{allowed_origin}', allowing any: {e}");
            layer.allow_origin(Any)
        }
    }
}

/// Start the API server and serve until the process exits.
pub async fn serve(config: ApiConfig, state: ApiState) {
    let app = build_router(state).layer(cors_layer(&config.allowed_origin));
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
