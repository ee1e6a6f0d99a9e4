//! Calendar endpoint: the month grid with per-day data markers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use super::{error_response, AppState};

/// Axum handler function for GET /api/calendar/:year/:month
pub async fn month_overview(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> impl IntoResponse {
    info!("GET /api/calendar/{}/{}", year, month);

    match state.calendar.month_overview(year, month).await {
        Ok(overview) => Json(overview).into_response(),
        Err(e) => error_response("building calendar overview", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;
    use axum::http::StatusCode;
    use shared::MonthOverview;

    #[tokio::test]
    async fn test_month_overview() {
        let state = test_state().await;

        let response = month_overview(State(state), Path((2025, 3)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let overview: MonthOverview = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(overview.month_name, "March");
        assert_eq!(overview.days.len() as u32, overview.leading_padding + 31);
    }

    #[tokio::test]
    async fn test_invalid_month() {
        let state = test_state().await;

        let response = month_overview(State(state), Path((2025, 0)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
