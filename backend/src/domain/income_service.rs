//! Daily income sheets: per-employee sales/tips/gratuity rows with derived
//! commission columns, plus date and period aggregation.

use std::collections::BTreeMap;

use anyhow::Result;
use csv::Writer;
use shared::{
    coerce_number, normalize_name, EmployeePeriodTotals, IncomeEdit, IncomeRow, IncomeTotals,
};
use tracing::info;

use super::{keys, validate_date, DomainError, ValueStore};

/// Every recorded day's rows, keyed by ISO date. Stored as one blob.
type IncomeData = BTreeMap<String, Vec<IncomeRow>>;

#[derive(Clone)]
pub struct IncomeService {
    store: ValueStore,
}

impl IncomeService {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<IncomeData> {
        Ok(self
            .store
            .get_json(keys::INCOME_DATA)
            .await?
            .unwrap_or_default())
    }

    /// The income rows for a date; an unvisited date reads as empty.
    pub async fn day(&self, date: &str) -> Result<Vec<IncomeRow>> {
        validate_date(date)?;
        Ok(self.load().await?.get(date).cloned().unwrap_or_default())
    }

    /// Apply one edit to a day's sheet and persist the result. Derived
    /// columns are refreshed on the touched row before anything is written.
    pub async fn apply(&self, date: &str, edit: IncomeEdit) -> Result<Vec<IncomeRow>> {
        validate_date(date)?;
        info!("Income edit on {}: {:?}", date, edit);

        let mut data = self.load().await?;
        let rows = data.entry(date.to_string()).or_default();
        apply_edit(rows, edit)?;
        let updated = rows.clone();

        self.store.put_json(keys::INCOME_DATA, &data).await?;
        Ok(updated)
    }

    /// Column sums for one date.
    pub async fn date_totals(&self, date: &str) -> Result<IncomeTotals> {
        let mut totals = IncomeTotals::default();
        for row in self.day(date).await? {
            totals.absorb(&row);
        }
        Ok(totals)
    }

    /// Column sums over an arbitrary set of dates.
    pub async fn period_totals(&self, dates: &[String]) -> Result<IncomeTotals> {
        for date in dates {
            validate_date(date)?;
        }
        let data = self.load().await?;
        let mut totals = IncomeTotals::default();
        for date in dates {
            for row in data.get(date.as_str()).map(Vec::as_slice).unwrap_or(&[]) {
                totals.absorb(row);
            }
        }
        Ok(totals)
    }

    /// Per-employee column sums over a set of dates. Names are matched after
    /// whitespace/case folding; the display name is the first spelling seen.
    pub async fn employee_period_totals(
        &self,
        dates: &[String],
        employees: &[String],
    ) -> Result<Vec<EmployeePeriodTotals>> {
        for date in dates {
            validate_date(date)?;
        }
        let data = self.load().await?;

        let mut results = Vec::new();
        for wanted in employees {
            let wanted_key = normalize_name(wanted);
            let mut totals = IncomeTotals::default();
            let mut display_name: Option<String> = None;

            for date in dates {
                for row in data.get(date.as_str()).map(Vec::as_slice).unwrap_or(&[]) {
                    if normalize_name(&row.name) == wanted_key {
                        totals.absorb(row);
                        display_name.get_or_insert_with(|| row.name.clone());
                    }
                }
            }

            results.push(EmployeePeriodTotals {
                name: display_name.unwrap_or_else(|| wanted.clone()),
                totals,
            });
        }
        Ok(results)
    }

    /// Render a day's sheet as CSV. `None` when the day has no rows.
    pub async fn export_csv(&self, date: &str) -> Result<Option<String>> {
        let rows = self.day(date).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record([
            "Name",
            "Position",
            "Net Sales ($)",
            "Tips ($)",
            "Gratuity ($)",
            "Commission (5%)",
            "Tips + Gratuity",
            "Take Home",
        ])?;
        for row in &rows {
            writer.write_record([
                row.name.clone(),
                row.position.clone(),
                coerce_number(row.net_sales).to_string(),
                coerce_number(row.tips).to_string(),
                coerce_number(row.gratuity).to_string(),
                format!("{:.2}", row.commission),
                format!("{:.2}", row.tips_plus_gratuity),
                format!("{:.2}", row.take_home),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
        Ok(Some(String::from_utf8(bytes)?))
    }

    /// Render per-employee period totals as CSV, one line per employee.
    pub async fn export_employee_period_csv(
        &self,
        dates: &[String],
        employees: &[String],
    ) -> Result<Option<String>> {
        if employees.is_empty() {
            return Ok(None);
        }
        let rows = self.employee_period_totals(dates, employees).await?;

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record([
            "Employee",
            "Net Sales",
            "Tips",
            "Gratuity",
            "Commission",
            "Tips + Gratuity",
            "Take Home",
        ])?;
        for row in &rows {
            writer.write_record([
                row.name.clone(),
                format!("{:.2}", row.totals.net_sales),
                format!("{:.2}", row.totals.tips),
                format!("{:.2}", row.totals.gratuity),
                format!("{:.2}", row.totals.commission),
                format!("{:.2}", row.totals.tips_plus_gratuity),
                format!("{:.2}", row.totals.take_home),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
        Ok(Some(String::from_utf8(bytes)?))
    }
}

fn apply_edit(rows: &mut Vec<IncomeRow>, edit: IncomeEdit) -> Result<(), DomainError> {
    match edit {
        IncomeEdit::AddRow => rows.push(IncomeRow::new()),
        IncomeEdit::DeleteRow { row_id } => {
            let index = rows
                .iter()
                .position(|r| r.id == row_id)
                .ok_or(DomainError::UnknownIncomeRow(row_id))?;
            rows.remove(index);
        }
        IncomeEdit::SetName { row_id, name } => {
            row_mut(rows, row_id)?.name = name;
        }
        IncomeEdit::SetPosition { row_id, position } => {
            row_mut(rows, row_id)?.position = position;
        }
        IncomeEdit::SetNetSales { row_id, amount } => {
            let row = row_mut(rows, row_id)?;
            row.net_sales = coerce_number(amount);
            row.recompute();
        }
        IncomeEdit::SetTips { row_id, amount } => {
            let row = row_mut(rows, row_id)?;
            row.tips = coerce_number(amount);
            row.recompute();
        }
        IncomeEdit::SetGratuity { row_id, amount } => {
            let row = row_mut(rows, row_id)?;
            row.gratuity = coerce_number(amount);
            row.recompute();
        }
        IncomeEdit::ToggleCommissionExclusion { row_id } => {
            let row = row_mut(rows, row_id)?;
            row.exclude_commission = !row.exclude_commission;
            row.recompute();
        }
    }
    Ok(())
}

fn row_mut(rows: &mut [IncomeRow], row_id: uuid::Uuid) -> Result<&mut IncomeRow, DomainError> {
    rows.iter_mut()
        .find(|r| r.id == row_id)
        .ok_or(DomainError::UnknownIncomeRow(row_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use uuid::Uuid;

    const EPS: f64 = 1e-9;
    const DATE: &str = "2025-03-01";

    async fn setup() -> IncomeService {
        let db = DbConnection::init_test().await.expect("test db");
        IncomeService::new(ValueStore::new(db))
    }

    async fn add_row(service: &IncomeService, date: &str, name: &str, net_sales: f64) -> Uuid {
        let rows = service.apply(date, IncomeEdit::AddRow).await.expect("add");
        let row_id = rows.last().expect("row").id;
        service
            .apply(
                date,
                IncomeEdit::SetName {
                    row_id,
                    name: name.to_string(),
                },
            )
            .await
            .expect("name");
        service
            .apply(
                date,
                IncomeEdit::SetNetSales {
                    row_id,
                    amount: net_sales,
                },
            )
            .await
            .expect("sales");
        row_id
    }

    #[tokio::test]
    async fn test_derived_columns_follow_edits() {
        let service = setup().await;
        let row_id = add_row(&service, DATE, "Ana", 200.0).await;

        let rows = service
            .apply(DATE, IncomeEdit::SetTips { row_id, amount: 50.0 })
            .await
            .expect("tips");

        let row = &rows[0];
        assert!((row.commission - 10.0).abs() < EPS);
        assert!((row.tips_plus_gratuity - 50.0).abs() < EPS);
        assert!((row.take_home - 40.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_toggle_exclusion_recomputes() {
        let service = setup().await;
        let row_id = add_row(&service, DATE, "Ana", 200.0).await;

        let rows = service
            .apply(DATE, IncomeEdit::ToggleCommissionExclusion { row_id })
            .await
            .expect("toggle");
        assert_eq!(rows[0].commission, 0.0);

        let rows = service
            .apply(DATE, IncomeEdit::ToggleCommissionExclusion { row_id })
            .await
            .expect("toggle back");
        assert!((rows[0].commission - 10.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_date_totals() {
        let service = setup().await;
        add_row(&service, DATE, "Ana", 100.0).await;
        add_row(&service, DATE, "Luis", 300.0).await;

        let totals = service.date_totals(DATE).await.expect("totals");
        assert!((totals.net_sales - 400.0).abs() < EPS);
        assert!((totals.commission - 20.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_period_totals_span_dates() {
        let service = setup().await;
        add_row(&service, "2025-03-01", "Ana", 100.0).await;
        add_row(&service, "2025-03-02", "Ana", 150.0).await;

        let dates = vec!["2025-03-01".to_string(), "2025-03-02".to_string()];
        let totals = service.period_totals(&dates).await.expect("totals");
        assert!((totals.net_sales - 250.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_employee_period_totals_normalize_names() {
        let service = setup().await;
        // Same person, different spelling across days
        add_row(&service, "2025-03-01", "Ana Pérez", 100.0).await;
        add_row(&service, "2025-03-02", "  ana pérez ", 150.0).await;
        add_row(&service, "2025-03-02", "Luis", 999.0).await;

        let dates = vec!["2025-03-01".to_string(), "2025-03-02".to_string()];
        let results = service
            .employee_period_totals(&dates, &["ANA PÉREZ".to_string()])
            .await
            .expect("totals");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Ana Pérez");
        assert!((results[0].totals.net_sales - 250.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_delete_row() {
        let service = setup().await;
        let first = add_row(&service, DATE, "Ana", 100.0).await;
        add_row(&service, DATE, "Luis", 300.0).await;

        let rows = service
            .apply(DATE, IncomeEdit::DeleteRow { row_id: first })
            .await
            .expect("delete");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Luis");
    }

    #[tokio::test]
    async fn test_unknown_row_is_rejected() {
        let service = setup().await;
        add_row(&service, DATE, "Ana", 100.0).await;

        let err = service
            .apply(
                DATE,
                IncomeEdit::SetTips {
                    row_id: Uuid::new_v4(),
                    amount: 5.0,
                },
            )
            .await
            .expect_err("unknown row");
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::UnknownIncomeRow(_))
        ));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let service = setup().await;
        add_row(&service, DATE, "Ana", 200.0).await;

        let csv = service
            .export_csv(DATE)
            .await
            .expect("export")
            .expect("has rows");
        assert!(csv.starts_with("Name,Position,Net Sales ($)"));
        assert!(csv.contains("Ana,,200,0,0,10.00,0.00,-10.00"));

        assert!(service
            .export_csv("2030-01-01")
            .await
            .expect("export")
            .is_none());
    }
}
