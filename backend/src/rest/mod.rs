//! HTTP surface. One module per feature; handlers log on entry, match on
//! the service result and map failures onto status codes.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::domain::{
    CalendarService, DomainError, IncomeService, PayrollService, TimeclockService,
    TipsPoolService, ValueStore,
};

pub mod calendar_apis;
pub mod data_apis;
pub mod income_apis;
pub mod payroll_apis;
pub mod timeclock_apis;
pub mod tips_pool_apis;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub value_store: ValueStore,
    pub tips_pool: TipsPoolService,
    pub income: IncomeService,
    pub payroll: PayrollService,
    pub timeclock: TimeclockService,
    pub calendar: CalendarService,
}

impl AppState {
    /// Wire every service to the same persistence collaborator.
    pub fn new(store: ValueStore) -> Self {
        Self {
            tips_pool: TipsPoolService::new(store.clone()),
            income: IncomeService::new(store.clone()),
            payroll: PayrollService::new(store.clone()),
            timeclock: TimeclockService::new(store.clone()),
            calendar: CalendarService::new(store.clone()),
            value_store: store,
        }
    }
}

/// Everything served under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(data_apis::health))
        .route(
            "/data",
            get(data_apis::get_all_data).post(data_apis::put_value),
        )
        .route("/data/:key", delete(data_apis::delete_value))
        .route("/tips-pool/:date", get(tips_pool_apis::get_day))
        .route("/tips-pool/:date/edits", post(tips_pool_apis::apply_edit))
        .route(
            "/tips-pool/:date/status",
            get(tips_pool_apis::allocation_status),
        )
        .route("/tips-pool/:date/export", get(tips_pool_apis::export_csv))
        .route("/income/:date", get(income_apis::get_day))
        .route("/income/:date/edits", post(income_apis::apply_edit))
        .route("/income/:date/totals", get(income_apis::date_totals))
        .route("/income/:date/export", get(income_apis::export_csv))
        .route("/income/period-totals", post(income_apis::period_totals))
        .route(
            "/income/employee-totals",
            post(income_apis::employee_period_totals),
        )
        .route(
            "/income/employee-totals/export",
            post(income_apis::export_employee_totals),
        )
        .route(
            "/payroll/reports",
            get(payroll_apis::list_reports).post(payroll_apis::import_report),
        )
        .route(
            "/payroll/reports/:id",
            get(payroll_apis::get_report).delete(payroll_apis::delete_report),
        )
        .route(
            "/payroll/reports/:id/analysis",
            get(payroll_apis::analyze_report),
        )
        .route(
            "/payroll/reports/:id/export",
            get(payroll_apis::export_report),
        )
        .route("/suggestions", get(payroll_apis::suggestions))
        .route(
            "/staff",
            get(timeclock_apis::list_staff).post(timeclock_apis::add_staff),
        )
        .route(
            "/staff/:id",
            put(timeclock_apis::update_staff).delete(timeclock_apis::remove_staff),
        )
        .route("/staff/:id/clock-in", post(timeclock_apis::clock_in))
        .route("/staff/:id/clock-out", post(timeclock_apis::clock_out))
        .route(
            "/time-entries",
            get(timeclock_apis::list_entries).post(timeclock_apis::add_manual_entry),
        )
        .route("/time-entries/summary", get(timeclock_apis::summary))
        .route("/time-entries/export", get(timeclock_apis::export_entries))
        .route(
            "/time-entries/:id",
            put(timeclock_apis::update_entry).delete(timeclock_apis::delete_entry),
        )
        .route("/calendar/:year/:month", get(calendar_apis::month_overview))
}

/// Map a failed service call onto a response. Precondition violations carry
/// their own status; anything else is logged and surfaced as a 500.
pub(crate) fn error_response(context: &str, err: anyhow::Error) -> Response {
    if let Some(domain) = err.downcast_ref::<DomainError>() {
        (domain_status(domain), domain.to_string()).into_response()
    } else {
        tracing::error!("{}: {:?}", context, err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {context} failed"),
        )
            .into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::UnknownRow(_)
        | DomainError::UnknownShare(_)
        | DomainError::UnknownIncomeRow(_)
        | DomainError::UnknownReport(_)
        | DomainError::UnknownStaff(_)
        | DomainError::UnknownEntry(_) => StatusCode::NOT_FOUND,
        DomainError::AlreadyClockedIn(_) | DomainError::NoOpenShift(_) => StatusCode::CONFLICT,
        DomainError::InvalidDate(_) | DomainError::Missing(_) => StatusCode::BAD_REQUEST,
    }
}

/// CSV body with the content type download clients expect.
pub(crate) fn csv_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response()
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let db = crate::db::DbConnection::init_test()
        .await
        .expect("Failed to create test database");
    AppState::new(ValueStore::new(db))
}
