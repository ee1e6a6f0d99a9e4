use serde::{Deserialize, Serialize};

/// Kind of cell in the month grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DayKind {
    /// Empty padding cell before the first day of the month.
    PaddingBefore,
    /// An actual day within the month.
    MonthDay,
}

/// One cell of the month grid with markers for the data recorded that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    /// Day of month, 0 for padding cells.
    pub day: u32,
    pub kind: DayKind,
    pub has_income: bool,
    pub has_tips_pool: bool,
    pub has_report: bool,
}

/// A month rendered as a Monday-first grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthOverview {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Leading padding cells before day 1 (0 when the month starts Monday).
    pub leading_padding: u32,
    pub days: Vec<DayCell>,
}
