use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coerce_number;

/// One service day's tip pool: the collected total plus the position rows
/// claiming percentage shares of it. Keyed externally by ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PoolDay {
    /// Total tips collected for the day.
    pub total: f64,
    /// Position rows in display order.
    pub rows: Vec<PositionRow>,
}

/// A job position's claim on the pool, expressed as a percentage of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub id: Uuid,
    /// Free-text position label; may be empty.
    pub position: String,
    /// Share of the pool total, 0-100. The sum across rows is advisory only.
    pub percentage: f64,
    /// Declared headcount; `employees.len()` tracks this after every edit.
    pub personnel: u32,
    pub employees: Vec<EmployeeShare>,
}

/// One employee's slice of a position row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeShare {
    pub id: Uuid,
    pub name: String,
    /// Hours worked in the position for the day.
    pub hours: f64,
    /// Derived hour-weighted share of the row claim. Never edited directly.
    pub tips: f64,
}

/// A single edit applied to one day's pool. Dispatch is exhaustive, so a new
/// edit kind cannot be added without deciding its recomputation behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PoolEdit {
    SetTotal { amount: f64 },
    AddRow,
    DeleteRow { row_id: Uuid },
    SetRowPosition { row_id: Uuid, position: String },
    SetRowPercentage { row_id: Uuid, percentage: f64 },
    SetRowPersonnel { row_id: Uuid, personnel: u32 },
    SetEmployeeName { row_id: Uuid, employee_id: Uuid, name: String },
    SetEmployeeHours { row_id: Uuid, employee_id: Uuid, hours: f64 },
}

/// Advisory reading of the percentage sum across a day's rows. Nothing is
/// clamped or auto-corrected; callers render this as a status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AllocationStatus {
    Remaining { percent: f64 },
    FullyAssigned,
    OverAssigned { percent: f64 },
}

impl EmployeeShare {
    /// A fresh share with no name, no hours and no tips.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            hours: 0.0,
            tips: 0.0,
        }
    }
}

impl Default for EmployeeShare {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionRow {
    /// An empty row: no position, zero percentage, zero personnel.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            position: String::new(),
            percentage: 0.0,
            personnel: 0,
            employees: Vec::new(),
        }
    }

    /// The absolute dollar amount this row is entitled to.
    pub fn claim(&self, total: f64) -> f64 {
        total * (self.percentage / 100.0)
    }

    pub fn total_hours(&self) -> f64 {
        self.employees.iter().map(|e| coerce_number(e.hours)).sum()
    }

    /// Resize the employee list to `count`, preserving existing shares and
    /// their hours when growing, truncating from the end when shrinking.
    pub fn set_personnel(&mut self, count: u32) {
        self.personnel = count;
        let count = count as usize;
        if count > self.employees.len() {
            let missing = count - self.employees.len();
            self.employees
                .extend(std::iter::repeat_with(EmployeeShare::new).take(missing));
        } else {
            self.employees.truncate(count);
        }
    }

    /// Hour-weighted split of this row's claim among its employees. A row
    /// with zero logged hours distributes nothing.
    pub fn recompute(&mut self, total: f64) {
        let claim = self.claim(total);
        let total_hours = self.total_hours();
        for share in &mut self.employees {
            share.tips = if total_hours > 0.0 {
                claim * coerce_number(share.hours) / total_hours
            } else {
                0.0
            };
        }
    }

    pub fn share_mut(&mut self, employee_id: Uuid) -> Option<&mut EmployeeShare> {
        self.employees.iter_mut().find(|e| e.id == employee_id)
    }
}

impl Default for PositionRow {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolDay {
    /// Recompute every employee's tips against the current total. Rows are
    /// independent, so this is just the per-row split applied across the day.
    pub fn recompute_all(&mut self) {
        let total = self.total;
        for row in &mut self.rows {
            row.recompute(total);
        }
    }

    pub fn row_mut(&mut self, row_id: Uuid) -> Option<&mut PositionRow> {
        self.rows.iter_mut().find(|r| r.id == row_id)
    }

    /// Sum of the percentage column across all rows. Pure read.
    pub fn percentage_sum(&self) -> f64 {
        self.rows.iter().map(|r| coerce_number(r.percentage)).sum()
    }

    pub fn allocation_status(&self) -> AllocationStatus {
        let sum = self.percentage_sum();
        if (sum - 100.0).abs() < 1e-9 {
            AllocationStatus::FullyAssigned
        } else if sum < 100.0 {
            AllocationStatus::Remaining {
                percent: 100.0 - sum,
            }
        } else {
            AllocationStatus::OverAssigned {
                percent: sum - 100.0,
            }
        }
    }
}
