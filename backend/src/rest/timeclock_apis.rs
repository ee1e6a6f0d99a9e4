//! Timeclock endpoints: staff roster, clock-in/out, manual entries, the
//! labor summary and the CSV export.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shared::{
    ClockInRequest, ManualEntryRequest, NewStaffRequest, TimeEntryQuery, UpdateEntryRequest,
    UpdateStaffRequest,
};
use tracing::info;
use uuid::Uuid;

use super::{csv_response, error_response, AppState};

/// Axum handler function for GET /api/staff
pub async fn list_staff(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/staff");

    match state.timeclock.staff().await {
        Ok(staff) => Json(staff).into_response(),
        Err(e) => error_response("listing staff", e),
    }
}

/// Axum handler function for POST /api/staff
pub async fn add_staff(
    State(state): State<AppState>,
    Json(request): Json<NewStaffRequest>,
) -> impl IntoResponse {
    info!("POST /api/staff - name: {}", request.name);

    match state.timeclock.add_staff(request).await {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(e) => error_response("adding staff member", e),
    }
}

/// Axum handler function for PUT /api/staff/:id
pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStaffRequest>,
) -> impl IntoResponse {
    info!("PUT /api/staff/{}", id);

    match state.timeclock.update_staff(id, request).await {
        Ok(member) => Json(member).into_response(),
        Err(e) => error_response("updating staff member", e),
    }
}

/// Axum handler function for DELETE /api/staff/:id
pub async fn remove_staff(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    info!("DELETE /api/staff/{}", id);

    match state.timeclock.remove_staff(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("removing staff member", e),
    }
}

/// Axum handler function for POST /api/staff/:id/clock-in
///
/// The body is optional; it only carries the shift note.
pub async fn clock_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<ClockInRequest>>,
) -> impl IntoResponse {
    info!("POST /api/staff/{}/clock-in", id);

    let note = request.map(|Json(r)| r.note).unwrap_or_default();
    match state.timeclock.clock_in(id, note).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => error_response("clocking in", e),
    }
}

/// Axum handler function for POST /api/staff/:id/clock-out
pub async fn clock_out(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    info!("POST /api/staff/{}/clock-out", id);

    match state.timeclock.clock_out(id).await {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => error_response("clocking out", e),
    }
}

/// Axum handler function for GET /api/time-entries
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<TimeEntryQuery>,
) -> impl IntoResponse {
    info!("GET /api/time-entries - query: {:?}", query);

    match state.timeclock.entries(&query).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => error_response("listing time entries", e),
    }
}

/// Axum handler function for POST /api/time-entries
pub async fn add_manual_entry(
    State(state): State<AppState>,
    Json(request): Json<ManualEntryRequest>,
) -> impl IntoResponse {
    info!("POST /api/time-entries - staff: {}", request.staff_id);

    match state.timeclock.add_manual(request).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => error_response("adding manual entry", e),
    }
}

/// Axum handler function for PUT /api/time-entries/:id
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    info!("PUT /api/time-entries/{}", id);

    match state.timeclock.update_entry(id, request).await {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => error_response("updating time entry", e),
    }
}

/// Axum handler function for DELETE /api/time-entries/:id
pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    info!("DELETE /api/time-entries/{}", id);

    match state.timeclock.delete_entry(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("deleting time entry", e),
    }
}

/// Axum handler function for GET /api/time-entries/summary
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<TimeEntryQuery>,
) -> impl IntoResponse {
    info!("GET /api/time-entries/summary - query: {:?}", query);

    match state.timeclock.summary(&query).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response("summarizing time entries", e),
    }
}

/// Axum handler function for GET /api/time-entries/export
pub async fn export_entries(
    State(state): State<AppState>,
    Query(query): Query<TimeEntryQuery>,
) -> impl IntoResponse {
    info!("GET /api/time-entries/export - query: {:?}", query);

    match state.timeclock.export_csv(&query).await {
        Ok(csv) => csv_response(csv),
        Err(e) => error_response("exporting time entries", e),
    }
}
