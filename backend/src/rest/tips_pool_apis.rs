//! Tips-pool endpoints: day state, edits, the advisory allocation status
//! and the CSV download.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shared::PoolEdit;
use tracing::info;

use super::{csv_response, error_response, AppState};

/// Axum handler function for GET /api/tips-pool/:date
pub async fn get_day(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("GET /api/tips-pool/{}", date);

    match state.tips_pool.day(&date).await {
        Ok(day) => Json(day).into_response(),
        Err(e) => error_response("loading tips pool day", e),
    }
}

/// Axum handler function for POST /api/tips-pool/:date/edits
pub async fn apply_edit(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(edit): Json<PoolEdit>,
) -> impl IntoResponse {
    info!("POST /api/tips-pool/{}/edits", date);

    match state.tips_pool.apply(&date, edit).await {
        Ok(day) => Json(day).into_response(),
        Err(e) => error_response("applying tips pool edit", e),
    }
}

/// Axum handler function for GET /api/tips-pool/:date/status
pub async fn allocation_status(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/tips-pool/{}/status", date);

    match state.tips_pool.allocation_status(&date).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => error_response("reading allocation status", e),
    }
}

/// Axum handler function for GET /api/tips-pool/:date/export
pub async fn export_csv(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/tips-pool/{}/export", date);

    match state.tips_pool.export_csv(&date).await {
        Ok(Some(csv)) => csv_response(csv),
        Ok(None) => (StatusCode::NOT_FOUND, "No tips pool data for this date").into_response(),
        Err(e) => error_response("exporting tips pool", e),
    }
}
