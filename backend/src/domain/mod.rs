//! Domain services. Each one loads a named JSON blob from the key-value
//! store, applies a command, recomputes whatever is derived, and explicitly
//! persists the result before returning it.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::DbConnection;

pub mod calendar;
pub mod income_service;
pub mod payroll_service;
pub mod timeclock_service;
pub mod tips_pool_service;

pub use calendar::CalendarService;
pub use income_service::IncomeService;
pub use payroll_service::PayrollService;
pub use timeclock_service::TimeclockService;
pub use tips_pool_service::TipsPoolService;

/// Well-known blob keys. The first three are seeded as defaults by the
/// full-state endpoint.
pub mod keys {
    pub const INCOME_DATA: &str = "income_data";
    pub const TIPS_POOL_DATA: &str = "tips_pool_data";
    pub const UPLOADED_REPORTS: &str = "uploaded_reports";
    pub const STAFF_MEMBERS: &str = "staff_members";
    pub const TIME_ENTRIES: &str = "time_entries";
}

/// Precondition violations. These never corrupt state: a service returns the
/// error before persisting anything.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown pool row: {0}")]
    UnknownRow(Uuid),
    #[error("unknown employee share: {0}")]
    UnknownShare(Uuid),
    #[error("unknown income row: {0}")]
    UnknownIncomeRow(Uuid),
    #[error("unknown payroll report: {0}")]
    UnknownReport(Uuid),
    #[error("unknown staff member: {0}")]
    UnknownStaff(Uuid),
    #[error("unknown time entry: {0}")]
    UnknownEntry(Uuid),
    #[error("{0} already has an open shift")]
    AlreadyClockedIn(String),
    #[error("{0} has no open shift")]
    NoOpenShift(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Require an ISO `YYYY-MM-DD` date.
pub fn validate_date(date: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(date.to_string()))
}

/// The persistence collaborator every service holds. Wraps the raw
/// key-value table with JSON encoding for typed blobs.
#[derive(Clone)]
pub struct ValueStore {
    db: DbConnection,
}

impl ValueStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        info!("Getting value for key: {}", key);
        self.db.get_value(key).await
    }

    pub async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        info!("Putting value for key: {}", key);
        self.db.put_value(key, value).await
    }

    pub async fn delete_value(&self, key: &str) -> Result<bool> {
        info!("Deleting value for key: {}", key);
        self.db.delete_value(key).await
    }

    pub async fn load_all(&self) -> Result<Vec<(String, String)>> {
        self.db.load_all().await
    }

    /// Fetch and decode a typed blob, `None` when the key was never written.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get_value(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("stored blob {key} is not valid JSON"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Encode and store a typed blob, overwriting whatever was there.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.db.put_value(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_round_trip() {
        let db = DbConnection::init_test().await.expect("test db");
        let store = ValueStore::new(db);

        let original = vec!["a".to_string(), "b".to_string()];
        store.put_json("list", &original).await.expect("put");

        let loaded: Option<Vec<String>> = store.get_json("list").await.expect("get");
        assert_eq!(loaded, Some(original));
    }

    #[tokio::test]
    async fn test_get_json_missing_key() {
        let db = DbConnection::init_test().await.expect("test db");
        let store = ValueStore::new(db);

        let loaded: Option<Vec<String>> = store.get_json("nope").await.expect("get");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_get_json_rejects_garbage() {
        let db = DbConnection::init_test().await.expect("test db");
        let store = ValueStore::new(db);

        store.put_value("broken", "{not json").await.expect("put");
        let loaded: Result<Option<Vec<String>>> = store.get_json("broken").await;
        assert!(loaded.is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2025-03-01").is_ok());
        assert!(validate_date("yesterday").is_err());
        assert!(validate_date("2025-13-01").is_err());
        assert!(validate_date("2025-02-30").is_err());
    }
}
