use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One worked shift as parsed from an uploaded point-of-sale export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub full_name: String,
    pub job_title: String,
    pub clock_in: String,
    pub clock_out: String,
    /// Payable decimal hours; this drives the pay calculation.
    pub hours: f64,
    /// `H:MM` rendering of `hours`, for display only.
    pub hours_display: String,
    pub rate: f64,
    pub pay: f64,
}

/// An uploaded payroll file after parsing, stamped with the business date it
/// arrived on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollReport {
    pub id: Uuid,
    pub file_name: String,
    /// ISO `YYYY-MM-DD` date the upload was recorded.
    pub upload_date: String,
    pub shifts: Vec<ShiftRecord>,
    pub total_payment: f64,
}

/// Request body for importing a raw delimited-text payroll file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReportRequest {
    pub file_name: String,
    pub content: String,
}

/// All shifts of one employee within a report, rolled up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeBreakdown {
    pub name: String,
    pub job_title: String,
    pub total_hours: f64,
    pub total_pay: f64,
    pub shifts: Vec<ShiftRecord>,
}

/// All shifts of one position within a report, rolled up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBreakdown {
    pub name: String,
    pub total_hours: f64,
    pub total_pay: f64,
    pub employee_count: usize,
}

/// Table-friendly employee line with a display-truncated name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeTableRow {
    pub name: String,
    pub hours: f64,
    pub pay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionTableRow {
    pub name: String,
    pub hours: f64,
    pub pay: f64,
    pub employees: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollTotals {
    pub total_hours: f64,
    pub total_pay: f64,
    pub unique_employees: usize,
    pub average_hours_per_employee: f64,
    pub average_pay_per_employee: f64,
}

/// Full analysis of one report: per-employee and per-position rollups plus
/// overall totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollAnalysis {
    pub employees: Vec<EmployeeBreakdown>,
    pub positions: Vec<PositionBreakdown>,
    pub employee_table: Vec<EmployeeTableRow>,
    pub position_table: Vec<PositionTableRow>,
    pub totals: PayrollTotals,
}

/// Position and employee-name suggestion lists for data-entry autofill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionLists {
    pub positions: Vec<String>,
    pub employees: Vec<String>,
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render decimal hours as `H:MM`. Minute rounding that lands on 60 carries
/// into the hour.
pub fn decimal_to_hhmm(hours: f64) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - hours.floor()) * 60.0).round() as i64;
    let (whole, minutes) = if minutes >= 60 {
        (whole + 1, minutes - 60)
    } else {
        (whole, minutes)
    };
    format!("{}:{:02}", whole, minutes)
}

/// Sum a collection of `H:MM` strings via total minutes. Malformed entries
/// contribute nothing.
pub fn sum_hhmm<'a, I>(times: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total_minutes: i64 = 0;
    for time in times {
        let mut parts = time.splitn(2, ':');
        let hours = parts.next().and_then(|h| h.parse::<i64>().ok());
        let minutes = parts.next().and_then(|m| m.parse::<i64>().ok());
        if let (Some(h), Some(m)) = (hours, minutes) {
            total_minutes += h * 60 + m;
        }
    }
    format!("{}:{:02}", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_to_hhmm() {
        assert_eq!(decimal_to_hhmm(0.0), "0:00");
        assert_eq!(decimal_to_hhmm(7.5), "7:30");
        assert_eq!(decimal_to_hhmm(8.25), "8:15");
        // 0.999h rounds to 60 minutes and carries
        assert_eq!(decimal_to_hhmm(1.999), "2:00");
    }

    #[test]
    fn test_sum_hhmm() {
        assert_eq!(sum_hhmm(["1:30", "2:45"]), "4:15");
        assert_eq!(sum_hhmm(["0:00"]), "0:00");
        // Malformed entries are skipped
        assert_eq!(sum_hhmm(["1:30", "bogus", "0:45"]), "2:15");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(10.016), 10.02);
        assert_eq!(round2(0.0), 0.0);
    }
}
