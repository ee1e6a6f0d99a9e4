//! Domain models shared between the HTTP service and its clients, plus the
//! pure arithmetic that belongs with them. Nothing in this crate does I/O.

use serde::{Deserialize, Serialize};

pub mod calendar;
pub mod income;
pub mod payroll;
pub mod pool;
pub mod timeclock;

pub use calendar::{DayCell, DayKind, MonthOverview};
pub use income::{
    normalize_name, EmployeePeriodRequest, EmployeePeriodTotals, IncomeEdit, IncomeRow,
    IncomeTotals, PeriodTotalsRequest, COMMISSION_RATE,
};
pub use payroll::{
    decimal_to_hhmm, round2, sum_hhmm, EmployeeBreakdown, EmployeeTableRow, ImportReportRequest,
    PayrollAnalysis, PayrollReport, PayrollTotals, PositionBreakdown, PositionTableRow,
    ShiftRecord, SuggestionLists,
};
pub use pool::{AllocationStatus, EmployeeShare, PoolDay, PoolEdit, PositionRow};
pub use timeclock::{
    ClockInRequest, LaborSummary, LaborSummaryRow, ManualEntryRequest, NewStaffRequest,
    StaffMember, TimeEntry, TimeEntryQuery, UpdateEntryRequest, UpdateStaffRequest,
};

/// One named blob in the key-value store. Values are arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: serde_json::Value,
}

/// Numeric inputs are never rejected: anything non-finite collapses to zero.
pub fn coerce_number(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse free-text numeric input, coercing failures to zero. A numeric
/// prefix followed by junk (`"7.5 hrs"`) still parses, matching how data
/// entry fields behave.
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim().trim_start_matches('$');
    if let Ok(value) = trimmed.parse::<f64>() {
        return coerce_number(value);
    }
    let prefix: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    prefix.parse::<f64>().map(coerce_number).unwrap_or(0.0)
}
