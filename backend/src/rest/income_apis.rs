//! Daily-income endpoints: day state, edits, totals, period aggregation and
//! the CSV downloads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shared::{EmployeePeriodRequest, IncomeEdit, PeriodTotalsRequest};
use tracing::info;

use super::{csv_response, error_response, AppState};

/// Axum handler function for GET /api/income/:date
pub async fn get_day(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("GET /api/income/{}", date);

    match state.income.day(&date).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response("loading income day", e),
    }
}

/// Axum handler function for POST /api/income/:date/edits
pub async fn apply_edit(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(edit): Json<IncomeEdit>,
) -> impl IntoResponse {
    info!("POST /api/income/{}/edits", date);

    match state.income.apply(&date, edit).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response("applying income edit", e),
    }
}

/// Axum handler function for GET /api/income/:date/totals
pub async fn date_totals(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/income/{}/totals", date);

    match state.income.date_totals(&date).await {
        Ok(totals) => Json(totals).into_response(),
        Err(e) => error_response("computing income totals", e),
    }
}

/// Axum handler function for POST /api/income/period-totals
pub async fn period_totals(
    State(state): State<AppState>,
    Json(request): Json<PeriodTotalsRequest>,
) -> impl IntoResponse {
    info!("POST /api/income/period-totals - {} dates", request.dates.len());

    match state.income.period_totals(&request.dates).await {
        Ok(totals) => Json(totals).into_response(),
        Err(e) => error_response("computing period totals", e),
    }
}

/// Axum handler function for POST /api/income/employee-totals
pub async fn employee_period_totals(
    State(state): State<AppState>,
    Json(request): Json<EmployeePeriodRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/income/employee-totals - {} dates, {} employees",
        request.dates.len(),
        request.employees.len()
    );

    match state
        .income
        .employee_period_totals(&request.dates, &request.employees)
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response("computing employee totals", e),
    }
}

/// Axum handler function for POST /api/income/employee-totals/export
pub async fn export_employee_totals(
    State(state): State<AppState>,
    Json(request): Json<EmployeePeriodRequest>,
) -> impl IntoResponse {
    info!("POST /api/income/employee-totals/export");

    match state
        .income
        .export_employee_period_csv(&request.dates, &request.employees)
        .await
    {
        Ok(Some(csv)) => csv_response(csv),
        Ok(None) => (StatusCode::NOT_FOUND, "No employees selected").into_response(),
        Err(e) => error_response("exporting employee totals", e),
    }
}

/// Axum handler function for GET /api/income/:date/export
pub async fn export_csv(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/income/{}/export", date);

    match state.income.export_csv(&date).await {
        Ok(Some(csv)) => csv_response(csv),
        Ok(None) => (StatusCode::NOT_FOUND, "No income data for this date").into_response(),
        Err(e) => error_response("exporting income day", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;
    use shared::IncomeRow;

    #[tokio::test]
    async fn test_add_row_then_get_day() {
        let state = test_state().await;
        let date = "2025-03-01".to_string();

        let response = apply_edit(
            State(state.clone()),
            Path(date.clone()),
            Json(IncomeEdit::AddRow),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_day(State(state), Path(date)).await.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let rows: Vec<IncomeRow> = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_period_totals_rejects_bad_dates() {
        let state = test_state().await;

        let request = PeriodTotalsRequest {
            dates: vec!["not-a-date".to_string()],
        };
        let response = period_totals(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
