use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:app_data.db";

/// DbConnection manages the single key-value table every domain service
/// persists its JSON blobs into.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query("PRAGMA journal_mode = WAL;").execute(pool).await?;

        // Create our database table if it doesn't exist
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_data (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Store a key-value pair in the database.
    /// This will overwrite any existing value for the same key.
    pub async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO app_data (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Retrieve a value by its key
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM app_data WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(r) => {
                let value: String = r.get("value");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Delete a value by its key
    pub async fn delete_value(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_data WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load every stored key-value pair at once, for the full-state endpoint
    pub async fn load_all(&self) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query("SELECT key, value FROM app_data ORDER BY key")
            .fetch_all(&*self.pool)
            .await?;
        let pairs = rows
            .iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect();
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test()
            .await
            .expect("Failed to create test database")
    }

    #[tokio::test]
    async fn test_put_and_get_value() {
        let db = setup_test().await;

        db.put_value("test_key", "test_value")
            .await
            .expect("Failed to put value");

        let result = db.get_value("test_key").await.expect("Failed to get value");
        assert_eq!(result.as_deref(), Some("test_value"));
    }

    #[tokio::test]
    async fn test_get_nonexistent_value() {
        let db = setup_test().await;

        let result = db
            .get_value("nonexistent_key")
            .await
            .expect("Query failed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_replace_value() {
        let db = setup_test().await;

        db.put_value("same_key", "initial_value")
            .await
            .expect("Failed to put initial value");
        db.put_value("same_key", "updated_value")
            .await
            .expect("Failed to update value");

        let result = db.get_value("same_key").await.expect("Failed to get value");
        assert_eq!(result.as_deref(), Some("updated_value"));
    }

    #[tokio::test]
    async fn test_delete_value() {
        let db = setup_test().await;

        db.put_value("key_to_delete", "value_to_delete")
            .await
            .expect("Failed to put value");

        let deleted = db
            .delete_value("key_to_delete")
            .await
            .expect("Failed to delete value");
        assert!(deleted, "Value should have been deleted");

        let exists_after = db
            .get_value("key_to_delete")
            .await
            .expect("Failed to check after deletion");
        assert!(exists_after.is_none());

        // Deleting again reports that nothing was there
        let deleted_again = db
            .delete_value("key_to_delete")
            .await
            .expect("Failed to re-delete value");
        assert!(!deleted_again);
    }

    #[tokio::test]
    async fn test_load_all() {
        let db = setup_test().await;

        db.put_value("alpha", r#"{"n":1}"#).await.expect("put");
        db.put_value("beta", "plain text").await.expect("put");

        let pairs = db.load_all().await.expect("Failed to load all");
        assert_eq!(
            pairs,
            vec![
                ("alpha".to_string(), r#"{"n":1}"#.to_string()),
                ("beta".to_string(), "plain text".to_string()),
            ]
        );
    }
}
