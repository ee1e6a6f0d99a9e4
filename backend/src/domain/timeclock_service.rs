//! Hourly staff and their clocked shifts: clock-in/out with an open-entry
//! guard, manual corrections, range filtering and the labor summary.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use csv::Writer;
use shared::{
    round2, LaborSummary, LaborSummaryRow, ManualEntryRequest, NewStaffRequest, StaffMember,
    TimeEntry, TimeEntryQuery, UpdateEntryRequest, UpdateStaffRequest,
};
use tracing::info;
use uuid::Uuid;

use super::{keys, validate_date, DomainError, ValueStore};

#[derive(Clone)]
pub struct TimeclockService {
    store: ValueStore,
}

impl TimeclockService {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    async fn load_staff(&self) -> Result<Vec<StaffMember>> {
        Ok(self
            .store
            .get_json(keys::STAFF_MEMBERS)
            .await?
            .unwrap_or_default())
    }

    async fn load_entries(&self) -> Result<Vec<TimeEntry>> {
        Ok(self
            .store
            .get_json(keys::TIME_ENTRIES)
            .await?
            .unwrap_or_default())
    }

    pub async fn staff(&self) -> Result<Vec<StaffMember>> {
        self.load_staff().await
    }

    pub async fn add_staff(&self, request: NewStaffRequest) -> Result<StaffMember> {
        if request.name.trim().is_empty() {
            return Err(DomainError::Missing("name").into());
        }
        info!("Adding staff member: {}", request.name);

        let member = StaffMember {
            id: Uuid::new_v4(),
            name: request.name,
            role: request.role,
            hourly_rate: shared::coerce_number(request.hourly_rate),
            active: true,
        };
        let mut staff = self.load_staff().await?;
        staff.push(member.clone());
        self.store.put_json(keys::STAFF_MEMBERS, &staff).await?;
        Ok(member)
    }

    pub async fn update_staff(
        &self,
        id: Uuid,
        request: UpdateStaffRequest,
    ) -> Result<StaffMember> {
        let mut staff = self.load_staff().await?;
        let member = staff
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::UnknownStaff(id))?;

        if let Some(name) = request.name {
            member.name = name;
        }
        if let Some(role) = request.role {
            member.role = role;
        }
        if let Some(rate) = request.hourly_rate {
            member.hourly_rate = shared::coerce_number(rate);
        }
        if let Some(active) = request.active {
            member.active = active;
        }
        let updated = member.clone();

        self.store.put_json(keys::STAFF_MEMBERS, &staff).await?;
        Ok(updated)
    }

    /// Remove a staff member. Their time entries stay on the books so past
    /// summaries keep adding up.
    pub async fn remove_staff(&self, id: Uuid) -> Result<()> {
        let mut staff = self.load_staff().await?;
        let before = staff.len();
        staff.retain(|m| m.id != id);
        if staff.len() == before {
            return Err(DomainError::UnknownStaff(id).into());
        }
        self.store.put_json(keys::STAFF_MEMBERS, &staff).await?;
        Ok(())
    }

    /// Open a shift now. A member can hold at most one open entry.
    pub async fn clock_in(&self, staff_id: Uuid, note: String) -> Result<TimeEntry> {
        let staff = self.load_staff().await?;
        let member = staff
            .iter()
            .find(|m| m.id == staff_id)
            .ok_or(DomainError::UnknownStaff(staff_id))?;

        let mut entries = self.load_entries().await?;
        if entries.iter().any(|e| e.staff_id == staff_id && e.end.is_none()) {
            return Err(DomainError::AlreadyClockedIn(member.name.clone()).into());
        }
        info!("Clock in: {}", member.name);

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            staff_id,
            start: Utc::now().to_rfc3339(),
            end: None,
            note,
        };
        entries.push(entry.clone());
        self.store.put_json(keys::TIME_ENTRIES, &entries).await?;
        Ok(entry)
    }

    /// Close the member's open shift now.
    pub async fn clock_out(&self, staff_id: Uuid) -> Result<TimeEntry> {
        let staff = self.load_staff().await?;
        let member = staff
            .iter()
            .find(|m| m.id == staff_id)
            .ok_or(DomainError::UnknownStaff(staff_id))?;

        let mut entries = self.load_entries().await?;
        let entry = entries
            .iter_mut()
            .find(|e| e.staff_id == staff_id && e.end.is_none())
            .ok_or_else(|| DomainError::NoOpenShift(member.name.clone()))?;
        info!("Clock out: {}", member.name);

        entry.end = Some(Utc::now().to_rfc3339());
        let closed = entry.clone();
        self.store.put_json(keys::TIME_ENTRIES, &entries).await?;
        Ok(closed)
    }

    /// Record a past shift by hand. Both ends are required.
    pub async fn add_manual(&self, request: ManualEntryRequest) -> Result<TimeEntry> {
        if request.start.trim().is_empty() {
            return Err(DomainError::Missing("start").into());
        }
        if request.end.trim().is_empty() {
            return Err(DomainError::Missing("end").into());
        }
        parse_timestamp(&request.start)?;
        parse_timestamp(&request.end)?;

        let staff = self.load_staff().await?;
        if !staff.iter().any(|m| m.id == request.staff_id) {
            return Err(DomainError::UnknownStaff(request.staff_id).into());
        }

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            staff_id: request.staff_id,
            start: request.start,
            end: Some(request.end),
            note: request.note,
        };
        let mut entries = self.load_entries().await?;
        entries.push(entry.clone());
        self.store.put_json(keys::TIME_ENTRIES, &entries).await?;
        Ok(entry)
    }

    pub async fn update_entry(&self, id: Uuid, request: UpdateEntryRequest) -> Result<TimeEntry> {
        let mut entries = self.load_entries().await?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DomainError::UnknownEntry(id))?;

        if let Some(start) = request.start {
            parse_timestamp(&start)?;
            entry.start = start;
        }
        if let Some(end) = request.end {
            parse_timestamp(&end)?;
            entry.end = Some(end);
        }
        if let Some(note) = request.note {
            entry.note = note;
        }
        let updated = entry.clone();

        self.store.put_json(keys::TIME_ENTRIES, &entries).await?;
        Ok(updated)
    }

    pub async fn delete_entry(&self, id: Uuid) -> Result<()> {
        let mut entries = self.load_entries().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(DomainError::UnknownEntry(id).into());
        }
        self.store.put_json(keys::TIME_ENTRIES, &entries).await?;
        Ok(())
    }

    /// Entries matching the filter, newest first.
    pub async fn entries(&self, query: &TimeEntryQuery) -> Result<Vec<TimeEntry>> {
        let bounds = range_bounds(query)?;
        let mut entries = self.load_entries().await?;

        entries.retain(|entry| {
            if let Some(staff_id) = query.staff_id {
                if entry.staff_id != staff_id {
                    return false;
                }
            }
            match (&bounds, DateTime::parse_from_rfc3339(&entry.start)) {
                (None, _) => true,
                (Some((from, to)), Ok(start)) => {
                    let start = start.with_timezone(&Utc);
                    start >= *from && start < *to
                }
                // Range filtering needs a readable timestamp
                (Some(_), Err(_)) => false,
            }
        });
        entries.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(entries)
    }

    /// Per-member hours and labor cost over the filtered entries, priced at
    /// each member's current rate.
    pub async fn summary(&self, query: &TimeEntryQuery) -> Result<LaborSummary> {
        let staff = self.load_staff().await?;
        let entries = self.entries(query).await?;
        let now = Utc::now();

        let mut rows: Vec<LaborSummaryRow> = Vec::new();
        for entry in &entries {
            let hours = entry.duration_hours(now);
            let member = staff.iter().find(|m| m.id == entry.staff_id);
            let rate = member.map(|m| m.hourly_rate).unwrap_or(0.0);
            let name = member
                .map(|m| m.name.clone())
                .unwrap_or_else(|| "?".to_string());

            match rows.iter_mut().find(|r| r.staff_id == entry.staff_id) {
                Some(row) => {
                    row.hours += hours;
                    row.amount += hours * rate;
                }
                None => rows.push(LaborSummaryRow {
                    staff_id: entry.staff_id,
                    name,
                    rate,
                    hours,
                    amount: hours * rate,
                }),
            }
        }

        let total_hours = rows.iter().map(|r| r.hours).sum();
        let total_amount = rows.iter().map(|r| r.amount).sum();
        Ok(LaborSummary {
            rows,
            total_hours,
            total_amount,
        })
    }

    /// Render the filtered entries as CSV, one line per shift.
    pub async fn export_csv(&self, query: &TimeEntryQuery) -> Result<String> {
        let staff = self.load_staff().await?;
        let entries = self.entries(query).await?;
        let now = Utc::now();

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record([
            "Employee", "Role", "Hourly", "Start", "End", "Hours", "Amount", "Note",
        ])?;
        for entry in &entries {
            let member = staff.iter().find(|m| m.id == entry.staff_id);
            let hours = entry.duration_hours(now);
            let rate = member.map(|m| m.hourly_rate).unwrap_or(0.0);
            writer.write_record([
                member.map(|m| m.name.clone()).unwrap_or_default(),
                member.map(|m| m.role.clone()).unwrap_or_default(),
                rate.to_string(),
                entry.start.clone(),
                entry.end.clone().unwrap_or_default(),
                format!("{:.2}", hours),
                format!("{:.2}", round2(hours * rate)),
                entry.note.clone(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
        Ok(String::from_utf8(bytes)?)
    }
}

fn parse_timestamp(raw: &str) -> Result<(), DomainError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|_| ())
        .map_err(|_| DomainError::InvalidDate(raw.to_string()))
}

/// Whole-day UTC bounds for the query's inclusive date range.
fn range_bounds(
    query: &TimeEntryQuery,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, DomainError> {
    let (from, to) = match (&query.from, &query.to) {
        (None, None) => return Ok(None),
        (from, to) => (from, to),
    };

    let lower = match from {
        Some(raw) => validate_date(raw)?,
        None => NaiveDate::MIN,
    };
    let upper = match to {
        Some(raw) => validate_date(raw)? + Duration::days(1),
        None => NaiveDate::MAX,
    };

    let lower = lower.and_time(NaiveTime::MIN).and_utc();
    let upper = upper.and_time(NaiveTime::MIN).and_utc();
    Ok(Some((lower, upper)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    const EPS: f64 = 1e-9;

    async fn setup() -> TimeclockService {
        let db = DbConnection::init_test().await.expect("test db");
        TimeclockService::new(ValueStore::new(db))
    }

    async fn hire(service: &TimeclockService, name: &str, rate: f64) -> StaffMember {
        service
            .add_staff(NewStaffRequest {
                name: name.to_string(),
                role: "Server".to_string(),
                hourly_rate: rate,
            })
            .await
            .expect("add staff")
    }

    #[tokio::test]
    async fn test_clock_in_guards_open_entries() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;

        service
            .clock_in(ana.id, String::new())
            .await
            .expect("clock in");

        let err = service
            .clock_in(ana.id, String::new())
            .await
            .expect_err("second clock in");
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::AlreadyClockedIn(_))
        ));

        // After clocking out the guard clears
        service.clock_out(ana.id).await.expect("clock out");
        service
            .clock_in(ana.id, String::new())
            .await
            .expect("clock in again");
    }

    #[tokio::test]
    async fn test_clock_out_requires_open_entry() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;

        let err = service.clock_out(ana.id).await.expect_err("nothing open");
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NoOpenShift(_))
        ));
    }

    #[tokio::test]
    async fn test_manual_entry_requires_both_ends() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;

        let err = service
            .add_manual(ManualEntryRequest {
                staff_id: ana.id,
                start: "2025-03-01T09:00:00+00:00".to_string(),
                end: String::new(),
                note: String::new(),
            })
            .await
            .expect_err("missing end");
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Missing("end"))
        ));
    }

    #[tokio::test]
    async fn test_summary_prices_hours_at_member_rate() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;
        let luis = hire(&service, "Luis", 18.0).await;

        for (staff_id, start, end) in [
            (ana.id, "2025-03-01T09:00:00+00:00", "2025-03-01T13:00:00+00:00"),
            (ana.id, "2025-03-02T09:00:00+00:00", "2025-03-02T11:30:00+00:00"),
            (luis.id, "2025-03-01T10:00:00+00:00", "2025-03-01T18:00:00+00:00"),
        ] {
            service
                .add_manual(ManualEntryRequest {
                    staff_id,
                    start: start.to_string(),
                    end: end.to_string(),
                    note: String::new(),
                })
                .await
                .expect("manual entry");
        }

        let summary = service
            .summary(&TimeEntryQuery::default())
            .await
            .expect("summary");

        assert_eq!(summary.rows.len(), 2);
        let ana_row = summary
            .rows
            .iter()
            .find(|r| r.staff_id == ana.id)
            .expect("ana row");
        assert!((ana_row.hours - 6.5).abs() < EPS);
        assert!((ana_row.amount - 104.0).abs() < EPS);
        assert!((summary.total_hours - 14.5).abs() < EPS);
        assert!((summary.total_amount - 248.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_range_filter_is_inclusive_on_whole_days() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;

        for (start, end) in [
            ("2025-03-01T09:00:00+00:00", "2025-03-01T17:00:00+00:00"),
            ("2025-03-02T23:30:00+00:00", "2025-03-03T02:00:00+00:00"),
            ("2025-03-05T09:00:00+00:00", "2025-03-05T17:00:00+00:00"),
        ] {
            service
                .add_manual(ManualEntryRequest {
                    staff_id: ana.id,
                    start: start.to_string(),
                    end: end.to_string(),
                    note: String::new(),
                })
                .await
                .expect("manual entry");
        }

        let query = TimeEntryQuery {
            from: Some("2025-03-01".to_string()),
            to: Some("2025-03-02".to_string()),
            staff_id: None,
        };
        let entries = service.entries(&query).await.expect("entries");

        // The late March 2 shift starts inside the range; March 5 does not
        assert_eq!(entries.len(), 2);
        // Newest first
        assert!(entries[0].start > entries[1].start);
    }

    #[tokio::test]
    async fn test_remove_staff_keeps_entries() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;
        service
            .add_manual(ManualEntryRequest {
                staff_id: ana.id,
                start: "2025-03-01T09:00:00+00:00".to_string(),
                end: "2025-03-01T17:00:00+00:00".to_string(),
                note: String::new(),
            })
            .await
            .expect("manual entry");

        service.remove_staff(ana.id).await.expect("remove");
        assert!(service.staff().await.expect("staff").is_empty());

        let entries = service
            .entries(&TimeEntryQuery::default())
            .await
            .expect("entries");
        assert_eq!(entries.len(), 1);

        // Orphaned entries still summarize, at a zero rate
        let summary = service
            .summary(&TimeEntryQuery::default())
            .await
            .expect("summary");
        assert_eq!(summary.rows[0].name, "?");
        assert_eq!(summary.rows[0].amount, 0.0);
        assert!((summary.rows[0].hours - 8.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_update_entry_rejects_garbage_timestamps() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;
        let entry = service
            .add_manual(ManualEntryRequest {
                staff_id: ana.id,
                start: "2025-03-01T09:00:00+00:00".to_string(),
                end: "2025-03-01T17:00:00+00:00".to_string(),
                note: String::new(),
            })
            .await
            .expect("manual entry");

        let err = service
            .update_entry(
                entry.id,
                UpdateEntryRequest {
                    start: Some("noonish".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("bad timestamp");
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidDate(_))
        ));

        let updated = service
            .update_entry(
                entry.id,
                UpdateEntryRequest {
                    note: Some("covered the patio".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("note update");
        assert_eq!(updated.note, "covered the patio");
    }

    #[tokio::test]
    async fn test_export_csv() {
        let service = setup().await;
        let ana = hire(&service, "Ana", 16.0).await;
        service
            .add_manual(ManualEntryRequest {
                staff_id: ana.id,
                start: "2025-03-01T09:00:00+00:00".to_string(),
                end: "2025-03-01T17:00:00+00:00".to_string(),
                note: "opening shift".to_string(),
            })
            .await
            .expect("manual entry");

        let csv = service
            .export_csv(&TimeEntryQuery::default())
            .await
            .expect("export");
        assert!(csv.starts_with("Employee,Role,Hourly,Start,End,Hours,Amount,Note"));
        assert!(csv.contains("Ana,Server,16,"));
        assert!(csv.contains("8.00,128.00,opening shift"));
    }
}
