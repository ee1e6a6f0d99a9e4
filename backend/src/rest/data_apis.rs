//! The raw key-value contract: full-state load, single-key store and delete,
//! plus the health probe.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use shared::KeyValue;
use tracing::info;

use super::{error_response, AppState};
use crate::domain::keys;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true, "ts": chrono::Utc::now().timestamp_millis() }))
}

/// Axum handler function for GET /api/data
///
/// Returns every stored blob as parsed JSON, seeded with defaults for the
/// three well-known keys so a fresh install reads as empty state rather
/// than missing keys.
pub async fn get_all_data(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/data");

    let pairs = match state.value_store.load_all().await {
        Ok(pairs) => pairs,
        Err(e) => return error_response("loading stored state", e),
    };

    let mut map = serde_json::Map::new();
    map.insert(keys::INCOME_DATA.to_string(), json!({}));
    map.insert(keys::TIPS_POOL_DATA.to_string(), json!({}));
    map.insert(keys::UPLOADED_REPORTS.to_string(), json!([]));
    for (key, raw) in pairs {
        // A value that is not valid JSON is served back as the raw string
        let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        map.insert(key, value);
    }

    Json(Value::Object(map)).into_response()
}

/// Axum handler function for POST /api/data
pub async fn put_value(
    State(state): State<AppState>,
    Json(kv): Json<KeyValue>,
) -> impl IntoResponse {
    info!("POST /api/data - key: {}", kv.key);

    if kv.key.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "key is required").into_response();
    }

    let raw = match serde_json::to_string(&kv.value) {
        Ok(raw) => raw,
        Err(e) => return error_response("encoding value", e.into()),
    };
    match state.value_store.put_value(&kv.key, &raw).await {
        Ok(()) => (StatusCode::CREATED, Json(kv)).into_response(),
        Err(e) => error_response("storing value", e),
    }
}

/// Axum handler function for DELETE /api/data/:key
pub async fn delete_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/data/{}", key);

    match state.value_store.delete_value(&key).await {
        Ok(deleted) => Json(json!({ "ok": true, "deleted": deleted })).into_response(),
        Err(e) => error_response("deleting value", e),
    }
}
