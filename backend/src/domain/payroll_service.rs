//! Payroll verification: parse uploaded point-of-sale shift exports, price
//! each shift from the house rate table, and aggregate the result per
//! employee and per position.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use once_cell::sync::Lazy;
use shared::{
    decimal_to_hhmm, parse_number, round2, sum_hhmm, EmployeeBreakdown, EmployeeTableRow,
    ImportReportRequest, PayrollAnalysis, PayrollReport, PayrollTotals, PositionBreakdown,
    PositionTableRow, ShiftRecord, SuggestionLists,
};
use tracing::info;
use uuid::Uuid;

use super::{keys, DomainError, ValueStore};

/// Applied when a shift's job title is missing from the rate table.
pub const FALLBACK_RATE: f64 = 9.99;

/// Hourly rate per job title.
static HOURLY_RATES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("Server", 9.99),
        ("Bartender", 12.00),
        ("Host", 12.00),
        ("Busser", 12.00),
        ("Runner", 12.00),
        ("Cook", 16.00),
        ("Pastry", 15.00),
    ])
});

/// Staff paid a monthly salary. Their shifts in an upload are ignored so the
/// hourly totals stay honest.
struct SalariedStaff {
    name: &'static str,
    #[allow(dead_code)]
    role: &'static str,
}

static SALARIED_ROSTER: Lazy<Vec<SalariedStaff>> = Lazy::new(|| {
    vec![
        SalariedStaff {
            name: "Ramón Ortega",
            role: "Manager",
        },
        SalariedStaff {
            name: "Celia Márquez",
            role: "Chef",
        },
        SalariedStaff {
            name: "Tomás Rivera",
            role: "Bartender",
        },
    ]
});

/// Position labels offered to data-entry autofill.
static POSITIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Server", "Bartender", "Host", "Busser", "Runner", "Cook", "Pastry",
    ]
});

/// Known staff names offered to data-entry autofill.
static KNOWN_EMPLOYEES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Germán González",
        "Juana Velázquez",
        "Arnaldo Sánchez",
        "Maris Sánchez",
        "Sandy Tapanes",
        "Kamila Navarro",
        "Luvian Silva",
        "Diana Rodríguez",
        "Osmany Piquero",
        "Ángel García",
    ]
});

#[derive(Clone)]
pub struct PayrollService {
    store: ValueStore,
}

impl PayrollService {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<Vec<PayrollReport>> {
        Ok(self
            .store
            .get_json(keys::UPLOADED_REPORTS)
            .await?
            .unwrap_or_default())
    }

    /// Parse an uploaded file, price its shifts, stamp it with today's
    /// business date and persist it alongside the earlier uploads.
    pub async fn import(&self, request: ImportReportRequest) -> Result<PayrollReport> {
        info!("Importing payroll file: {}", request.file_name);

        let shifts = parse_shifts(&request.content)?;
        let total_payment = round2(shifts.iter().map(|s| s.pay).sum());
        let report = PayrollReport {
            id: Uuid::new_v4(),
            file_name: request.file_name,
            upload_date: business_date(Utc::now()),
            shifts,
            total_payment,
        };

        let mut reports = self.load().await?;
        reports.push(report.clone());
        self.store.put_json(keys::UPLOADED_REPORTS, &reports).await?;
        Ok(report)
    }

    pub async fn reports(&self) -> Result<Vec<PayrollReport>> {
        self.load().await
    }

    pub async fn report(&self, id: Uuid) -> Result<PayrollReport> {
        self.load()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::UnknownReport(id).into())
    }

    pub async fn delete_report(&self, id: Uuid) -> Result<()> {
        let mut reports = self.load().await?;
        let before = reports.len();
        reports.retain(|r| r.id != id);
        if reports.len() == before {
            return Err(DomainError::UnknownReport(id).into());
        }
        self.store.put_json(keys::UPLOADED_REPORTS, &reports).await?;
        Ok(())
    }

    /// Roll a report up per employee and per position, with overall totals.
    pub async fn analyze(&self, id: Uuid) -> Result<PayrollAnalysis> {
        let report = self.report(id).await?;
        Ok(analyze_shifts(&report.shifts))
    }

    /// Render a report as CSV grouped by employee, each group closed by a
    /// total line carrying decimal and `H:MM` hour sums.
    pub async fn export_csv(&self, id: Uuid) -> Result<String> {
        let report = self.report(id).await?;
        let analysis = analyze_shifts(&report.shifts);

        let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        writer.write_record([
            "Full Name",
            "Position",
            "Hourly Rate",
            "Clock In",
            "Clock Out",
            "Hours (Decimal)",
            "Hours (H:MM)",
            "Pay",
        ])?;

        for employee in &analysis.employees {
            for shift in &employee.shifts {
                writer.write_record([
                    shift.full_name.clone(),
                    shift.job_title.clone(),
                    format!("${:.2}", shift.rate),
                    shift.clock_in.clone(),
                    shift.clock_out.clone(),
                    format!("{:.2}", shift.hours),
                    shift.hours_display.clone(),
                    format!("${:.2}", shift.pay),
                ])?;
            }
            let hhmm_total = sum_hhmm(employee.shifts.iter().map(|s| s.hours_display.as_str()));
            writer.write_record([
                format!("Employee total: {}", employee.name),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                format!("{:.2}", employee.total_hours),
                hhmm_total,
                format!("${:.2}", employee.total_pay),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Autofill lists for the entry forms.
    pub fn suggestions(&self) -> SuggestionLists {
        SuggestionLists {
            positions: POSITIONS.iter().map(|p| p.to_string()).collect(),
            employees: KNOWN_EMPLOYEES.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// The business day runs on Eastern time; stamp uploads accordingly.
fn business_date(now: DateTime<Utc>) -> String {
    (now - Duration::hours(5)).date_naive().format("%Y-%m-%d").to_string()
}

/// True when the name matches anyone on the salaried roster. Matching is
/// loose on purpose: any word of the roster name appearing in the candidate
/// counts, since uploads abbreviate names inconsistently.
fn is_salaried(name: &str) -> bool {
    let candidate = name.to_lowercase();
    SALARIED_ROSTER.iter().any(|staff| {
        staff
            .name
            .split_whitespace()
            .take(2)
            .any(|word| candidate.contains(&word.to_lowercase()))
    })
}

/// Parse the raw upload. Expected columns: location, full name, job title,
/// clock-in, clock-out, total hours, unpaid break, paid break, payable
/// decimal hours. Short rows, rows missing identity fields and salaried
/// staff are skipped rather than rejected.
fn parse_shifts(content: &str) -> Result<Vec<ShiftRecord>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut shifts = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 9 {
            continue;
        }

        let full_name = record.get(1).unwrap_or("").trim().to_string();
        let job_title = record.get(2).unwrap_or("").trim().to_string();
        let clock_in = record.get(3).unwrap_or("").trim().to_string();
        let clock_out = record.get(4).unwrap_or("").trim().to_string();
        if full_name.is_empty() || job_title.is_empty() || clock_in.is_empty() {
            continue;
        }
        if is_salaried(&full_name) {
            continue;
        }

        // Pay is computed from the payable decimal hours, not the H:MM
        // rendering, so rounding never shorts anyone.
        let hours = parse_number(record.get(8).unwrap_or(""));
        let rate = HOURLY_RATES
            .get(job_title.as_str())
            .copied()
            .unwrap_or(FALLBACK_RATE);
        let pay = round2(hours * rate);

        shifts.push(ShiftRecord {
            hours_display: decimal_to_hhmm(hours),
            full_name,
            job_title,
            clock_in,
            clock_out,
            hours,
            rate,
            pay,
        });
    }
    Ok(shifts)
}

fn analyze_shifts(shifts: &[ShiftRecord]) -> PayrollAnalysis {
    let mut employees: Vec<EmployeeBreakdown> = Vec::new();
    for shift in shifts {
        match employees.iter_mut().find(|e| e.name == shift.full_name) {
            Some(entry) => {
                entry.total_hours += shift.hours;
                entry.total_pay += shift.pay;
                entry.shifts.push(shift.clone());
            }
            None => employees.push(EmployeeBreakdown {
                name: shift.full_name.clone(),
                job_title: shift.job_title.clone(),
                total_hours: shift.hours,
                total_pay: shift.pay,
                shifts: vec![shift.clone()],
            }),
        }
    }

    let mut positions: Vec<(PositionBreakdown, Vec<String>)> = Vec::new();
    for shift in shifts {
        match positions.iter_mut().find(|(p, _)| p.name == shift.job_title) {
            Some((entry, names)) => {
                entry.total_hours += shift.hours;
                entry.total_pay += shift.pay;
                if !names.contains(&shift.full_name) {
                    names.push(shift.full_name.clone());
                    entry.employee_count += 1;
                }
            }
            None => positions.push((
                PositionBreakdown {
                    name: shift.job_title.clone(),
                    total_hours: shift.hours,
                    total_pay: shift.pay,
                    employee_count: 1,
                },
                vec![shift.full_name.clone()],
            )),
        }
    }
    let positions: Vec<PositionBreakdown> = positions.into_iter().map(|(p, _)| p).collect();

    let employee_table = employees
        .iter()
        .map(|e| EmployeeTableRow {
            name: truncate_name(&e.name),
            hours: round2(e.total_hours),
            pay: round2(e.total_pay),
        })
        .collect();
    let position_table = positions
        .iter()
        .map(|p| PositionTableRow {
            name: p.name.clone(),
            hours: round2(p.total_hours),
            pay: round2(p.total_pay),
            employees: p.employee_count,
        })
        .collect();

    let total_hours: f64 = shifts.iter().map(|s| s.hours).sum();
    let total_pay: f64 = shifts.iter().map(|s| s.pay).sum();
    let unique_employees = employees.len();
    let totals = PayrollTotals {
        total_hours: round2(total_hours),
        total_pay: round2(total_pay),
        unique_employees,
        average_hours_per_employee: if unique_employees > 0 {
            round2(total_hours / unique_employees as f64)
        } else {
            0.0
        },
        average_pay_per_employee: if unique_employees > 0 {
            round2(total_pay / unique_employees as f64)
        } else {
            0.0
        },
    };

    PayrollAnalysis {
        employees,
        positions,
        employee_table,
        position_table,
        totals,
    }
}

/// Long names get elided in table rows so charts stay readable.
fn truncate_name(name: &str) -> String {
    if name.chars().count() > 20 {
        let short: String = name.chars().take(20).collect();
        format!("{short}...")
    } else {
        name.to_string()
    }
}
