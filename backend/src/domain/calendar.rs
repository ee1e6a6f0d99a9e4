//! Calendar overview: which days of a month have income rows, tips-pool
//! rows, or an uploaded payroll report. The grid is Monday-first.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use shared::{DayCell, DayKind, IncomeRow, MonthOverview, PayrollReport, PoolDay};

use super::{keys, DomainError, ValueStore};

#[derive(Clone)]
pub struct CalendarService {
    store: ValueStore,
}

impl CalendarService {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    /// Build the month grid, probing the stored blobs for per-day markers.
    pub async fn month_overview(&self, year: i32, month: u32) -> Result<MonthOverview> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidDate(format!("{year}-{month}")).into());
        }

        let income: BTreeMap<String, Vec<IncomeRow>> = self
            .store
            .get_json(keys::INCOME_DATA)
            .await?
            .unwrap_or_default();
        let pools: BTreeMap<String, PoolDay> = self
            .store
            .get_json(keys::TIPS_POOL_DATA)
            .await?
            .unwrap_or_default();
        let reports: Vec<PayrollReport> = self
            .store
            .get_json(keys::UPLOADED_REPORTS)
            .await?
            .unwrap_or_default();

        let income_dates: HashSet<&str> = income
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(date, _)| date.as_str())
            .collect();
        let pool_dates: HashSet<&str> = pools
            .iter()
            .filter(|(_, day)| !day.rows.is_empty())
            .map(|(date, _)| date.as_str())
            .collect();
        let report_dates: HashSet<&str> =
            reports.iter().map(|r| r.upload_date.as_str()).collect();

        let leading_padding = first_weekday(year, month);
        let mut days = Vec::new();
        for _ in 0..leading_padding {
            days.push(DayCell {
                day: 0,
                kind: DayKind::PaddingBefore,
                has_income: false,
                has_tips_pool: false,
                has_report: false,
            });
        }
        for day in 1..=days_in_month(year, month) {
            let date = format!("{year:04}-{month:02}-{day:02}");
            days.push(DayCell {
                day,
                kind: DayKind::MonthDay,
                has_income: income_dates.contains(date.as_str()),
                has_tips_pool: pool_dates.contains(date.as_str()),
                has_report: report_dates.contains(date.as_str()),
            });
        }

        Ok(MonthOverview {
            year,
            month,
            month_name: month_name(month).to_string(),
            leading_padding,
            days,
        })
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Monday-first weekday index of the month's first day (Monday = 0).
pub fn first_weekday(year: i32, month: u32) -> u32 {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.weekday().num_days_from_monday(),
        None => 0,
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Invalid Month",
    }
}
