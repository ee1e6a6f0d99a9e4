//! The tips-pool allocator. Owns the per-date pool records, applies edits,
//! keeps every employee's derived tips consistent, and persists explicitly
//! after each mutation.

use std::collections::BTreeMap;

use anyhow::Result;
use csv::WriterBuilder;
use shared::{coerce_number, AllocationStatus, PoolDay, PoolEdit, PositionRow};
use tracing::info;

use super::{keys, validate_date, DomainError, ValueStore};

/// Every recorded day, keyed by ISO date. Stored as one blob.
type PoolData = BTreeMap<String, PoolDay>;

#[derive(Clone)]
pub struct TipsPoolService {
    store: ValueStore,
}

impl TipsPoolService {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<PoolData> {
        Ok(self
            .store
            .get_json(keys::TIPS_POOL_DATA)
            .await?
            .unwrap_or_default())
    }

    /// The pool record for a date. Days are created lazily, so an unvisited
    /// date reads as an empty pool rather than an error.
    pub async fn day(&self, date: &str) -> Result<PoolDay> {
        validate_date(date)?;
        Ok(self.load().await?.get(date).cloned().unwrap_or_default())
    }

    /// Apply one edit to a day's pool and persist the result. Derived tips
    /// are recomputed before anything is written, so callers never observe a
    /// stale split. An unknown row or share id leaves the store untouched.
    pub async fn apply(&self, date: &str, edit: PoolEdit) -> Result<PoolDay> {
        validate_date(date)?;
        info!("Tips pool edit on {}: {:?}", date, edit);

        let mut data = self.load().await?;
        let day = data.entry(date.to_string()).or_default();
        apply_edit(day, edit)?;
        let updated = day.clone();

        self.store.put_json(keys::TIPS_POOL_DATA, &data).await?;
        Ok(updated)
    }

    /// Advisory percentage-sum status for a date. Pure read.
    pub async fn allocation_status(&self, date: &str) -> Result<AllocationStatus> {
        Ok(self.day(date).await?.allocation_status())
    }

    /// Render a day's distribution as CSV, one line per employee share.
    /// `None` when the day has no rows to export.
    pub async fn export_csv(&self, date: &str) -> Result<Option<String>> {
        let day = self.day(date).await?;
        if day.rows.is_empty() {
            return Ok(None);
        }

        let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        writer.write_record([format!("Total tips pool: ${:.2}", day.total)])?;
        writer.write_record([""])?;
        writer.write_record([
            "Position",
            "Percent Assigned (%)",
            "Employee",
            "Hours Worked",
            "Tips Received ($)",
        ])?;

        for row in &day.rows {
            if row.employees.is_empty() {
                writer.write_record([
                    row.position.clone(),
                    row.percentage.to_string(),
                    "No employees assigned".to_string(),
                    "0".to_string(),
                    "0.00".to_string(),
                ])?;
                continue;
            }
            for share in &row.employees {
                writer.write_record([
                    row.position.clone(),
                    row.percentage.to_string(),
                    share.name.clone(),
                    share.hours.to_string(),
                    format!("{:.2}", share.tips),
                ])?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
        Ok(Some(String::from_utf8(bytes)?))
    }
}

/// Apply one edit in place. Only the affected row is recomputed, except for a
/// total change, which rescales every row's split.
fn apply_edit(day: &mut PoolDay, edit: PoolEdit) -> Result<(), DomainError> {
    match edit {
        PoolEdit::SetTotal { amount } => {
            day.total = coerce_number(amount);
            day.recompute_all();
        }
        PoolEdit::AddRow => {
            // Zero claim and zero employees, nothing to recompute
            day.rows.push(PositionRow::new());
        }
        PoolEdit::DeleteRow { row_id } => {
            let index = day
                .rows
                .iter()
                .position(|r| r.id == row_id)
                .ok_or(DomainError::UnknownRow(row_id))?;
            day.rows.remove(index);
        }
        PoolEdit::SetRowPosition { row_id, position } => {
            row_mut(day, row_id)?.position = position;
        }
        PoolEdit::SetRowPercentage { row_id, percentage } => {
            let total = day.total;
            let row = row_mut(day, row_id)?;
            row.percentage = coerce_number(percentage);
            row.recompute(total);
        }
        PoolEdit::SetRowPersonnel { row_id, personnel } => {
            let total = day.total;
            let row = row_mut(day, row_id)?;
            row.set_personnel(personnel);
            row.recompute(total);
        }
        PoolEdit::SetEmployeeName {
            row_id,
            employee_id,
            name,
        } => {
            let row = row_mut(day, row_id)?;
            let share = row
                .share_mut(employee_id)
                .ok_or(DomainError::UnknownShare(employee_id))?;
            share.name = name;
        }
        PoolEdit::SetEmployeeHours {
            row_id,
            employee_id,
            hours,
        } => {
            let total = day.total;
            let row = row_mut(day, row_id)?;
            let share = row
                .share_mut(employee_id)
                .ok_or(DomainError::UnknownShare(employee_id))?;
            share.hours = coerce_number(hours);
            row.recompute(total);
        }
    }
    Ok(())
}

fn row_mut(day: &mut PoolDay, row_id: uuid::Uuid) -> Result<&mut PositionRow, DomainError> {
    day.row_mut(row_id).ok_or(DomainError::UnknownRow(row_id))
}
