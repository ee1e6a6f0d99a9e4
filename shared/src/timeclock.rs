use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hours above this are assumed to be bad data rather than a real shift.
const MAX_SHIFT_HOURS: f64 = 1e6;

/// A member of staff on the hourly clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub hourly_rate: f64,
    pub active: bool,
}

/// One clocked shift. An entry without an `end` is still open and its
/// duration is measured against the current time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub staff_id: Uuid,
    /// RFC 3339 timestamp.
    pub start: String,
    /// RFC 3339 timestamp, `None` while the shift is open.
    pub end: Option<String>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStaffRequest {
    pub name: String,
    pub role: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateStaffRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub hourly_rate: Option<f64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClockInRequest {
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEntryRequest {
    pub staff_id: Uuid,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateEntryRequest {
    pub start: Option<String>,
    pub end: Option<String>,
    pub note: Option<String>,
}

/// Filter for listing, summarizing and exporting entries. Dates are ISO
/// `YYYY-MM-DD` and the range is inclusive on whole days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeEntryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub staff_id: Option<Uuid>,
}

/// One staff member's line in a labor summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborSummaryRow {
    pub staff_id: Uuid,
    pub name: String,
    pub rate: f64,
    pub hours: f64,
    pub amount: f64,
}

/// Hours and labor cost over a filtered set of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LaborSummary {
    pub rows: Vec<LaborSummaryRow>,
    pub total_hours: f64,
    pub total_amount: f64,
}

impl TimeEntry {
    /// Duration in hours. An unparseable timestamp yields zero; open entries
    /// run until `now`; the result is clamped to a sane shift length.
    pub fn duration_hours(&self, now: DateTime<Utc>) -> f64 {
        let start = match DateTime::parse_from_rfc3339(&self.start) {
            Ok(t) => t.with_timezone(&Utc),
            Err(_) => return 0.0,
        };
        let end = match &self.end {
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => t.with_timezone(&Utc),
                Err(_) => return 0.0,
            },
            None => now,
        };
        let hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
        hours.clamp(0.0, MAX_SHIFT_HOURS)
    }
}
