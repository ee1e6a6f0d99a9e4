//! Payroll endpoints: report import, listing, analysis, export and the
//! autofill suggestion lists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shared::ImportReportRequest;
use tracing::info;
use uuid::Uuid;

use super::{csv_response, error_response, AppState};

/// Axum handler function for POST /api/payroll/reports
pub async fn import_report(
    State(state): State<AppState>,
    Json(request): Json<ImportReportRequest>,
) -> impl IntoResponse {
    info!("POST /api/payroll/reports - file: {}", request.file_name);

    match state.payroll.import(request).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => error_response("importing payroll file", e),
    }
}

/// Axum handler function for GET /api/payroll/reports
pub async fn list_reports(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/payroll/reports");

    match state.payroll.reports().await {
        Ok(reports) => Json(reports).into_response(),
        Err(e) => error_response("listing payroll reports", e),
    }
}

/// Axum handler function for GET /api/payroll/reports/:id
pub async fn get_report(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    info!("GET /api/payroll/reports/{}", id);

    match state.payroll.report(id).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response("loading payroll report", e),
    }
}

/// Axum handler function for DELETE /api/payroll/reports/:id
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("DELETE /api/payroll/reports/{}", id);

    match state.payroll.delete_report(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("deleting payroll report", e),
    }
}

/// Axum handler function for GET /api/payroll/reports/:id/analysis
pub async fn analyze_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("GET /api/payroll/reports/{}/analysis", id);

    match state.payroll.analyze(id).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => error_response("analyzing payroll report", e),
    }
}

/// Axum handler function for GET /api/payroll/reports/:id/export
pub async fn export_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("GET /api/payroll/reports/{}/export", id);

    match state.payroll.export_csv(id).await {
        Ok(csv) => csv_response(csv),
        Err(e) => error_response("exporting payroll report", e),
    }
}

/// Axum handler function for GET /api/suggestions
pub async fn suggestions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.payroll.suggestions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;
    use shared::PayrollReport;

    const SAMPLE: &str = "\
Location,Full Name,Job Title,In Date,Out Date,Total Hours,Unpaid Break,Paid Break,Payable Hours
Main,Ana López,Server,2025-03-01 10:00,2025-03-01 16:00,6.0,0,0,6.0
";

    #[tokio::test]
    async fn test_import_then_fetch_report() {
        let state = test_state().await;

        let request = ImportReportRequest {
            file_name: "week9.csv".to_string(),
            content: SAMPLE.to_string(),
        };
        let response = import_report(State(state.clone()), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let report: PayrollReport = serde_json::from_slice(&bytes).expect("json");

        let response = get_report(State(state), Path(report.id)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_report_is_not_found() {
        let state = test_state().await;

        let response = analyze_report(State(state), Path(Uuid::new_v4()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
