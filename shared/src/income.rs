use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coerce_number;

/// House commission withheld from tips and gratuity, as a share of net sales.
pub const COMMISSION_RATE: f64 = 0.05;

/// One employee's line on a day's income sheet. The last three fields are
/// derived and recomputed on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub net_sales: f64,
    pub tips: f64,
    pub gratuity: f64,
    /// Some staff do not owe the house commission on their sales.
    pub exclude_commission: bool,
    /// `net_sales * 5%`, or zero when excluded.
    pub commission: f64,
    pub tips_plus_gratuity: f64,
    /// `tips + gratuity - commission`.
    pub take_home: f64,
}

/// A single edit applied to one day's income sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IncomeEdit {
    AddRow,
    DeleteRow { row_id: Uuid },
    SetName { row_id: Uuid, name: String },
    SetPosition { row_id: Uuid, position: String },
    SetNetSales { row_id: Uuid, amount: f64 },
    SetTips { row_id: Uuid, amount: f64 },
    SetGratuity { row_id: Uuid, amount: f64 },
    ToggleCommissionExclusion { row_id: Uuid },
}

/// Column sums over any set of income rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IncomeTotals {
    pub net_sales: f64,
    pub tips: f64,
    pub gratuity: f64,
    pub commission: f64,
    pub tips_plus_gratuity: f64,
    pub take_home: f64,
}

/// Per-employee totals over a selected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePeriodTotals {
    pub name: String,
    pub totals: IncomeTotals,
}

/// Request body for totals over an arbitrary set of dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotalsRequest {
    pub dates: Vec<String>,
}

/// Request body for per-employee totals over a set of dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePeriodRequest {
    pub dates: Vec<String>,
    pub employees: Vec<String>,
}

impl IncomeRow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            position: String::new(),
            net_sales: 0.0,
            tips: 0.0,
            gratuity: 0.0,
            exclude_commission: false,
            commission: 0.0,
            tips_plus_gratuity: 0.0,
            take_home: 0.0,
        }
    }

    /// Refresh the derived columns from the editable ones.
    pub fn recompute(&mut self) {
        let net_sales = coerce_number(self.net_sales);
        let tips = coerce_number(self.tips);
        let gratuity = coerce_number(self.gratuity);

        self.commission = if self.exclude_commission {
            0.0
        } else {
            net_sales * COMMISSION_RATE
        };
        self.tips_plus_gratuity = tips + gratuity;
        self.take_home = self.tips_plus_gratuity - self.commission;
    }
}

impl Default for IncomeRow {
    fn default() -> Self {
        Self::new()
    }
}

impl IncomeTotals {
    pub fn absorb(&mut self, row: &IncomeRow) {
        self.net_sales += coerce_number(row.net_sales);
        self.tips += coerce_number(row.tips);
        self.gratuity += coerce_number(row.gratuity);
        self.commission += row.commission;
        self.tips_plus_gratuity += row.tips_plus_gratuity;
        self.take_home += row.take_home;
    }

    pub fn merge(&mut self, other: &IncomeTotals) {
        self.net_sales += other.net_sales;
        self.tips += other.tips;
        self.gratuity += other.gratuity;
        self.commission += other.commission;
        self.tips_plus_gratuity += other.tips_plus_gratuity;
        self.take_home += other.take_home;
    }
}

/// Fold whitespace and case so the same person entered twice with different
/// spelling still matches during period aggregation.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
