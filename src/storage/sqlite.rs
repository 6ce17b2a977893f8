//! SQLite-backed key/value store.

use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{KeyValueStore, StorageError};

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and applies migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        // In-memory databases exist per connection, so keep a single one.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM key_value_store WHERE key = ?")
            .bind(key).fetch_optional(&self.pool).await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO key_value_store (key, value, updated_at) VALUES (?, ?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at")
            .bind(key).bind(value).bind(Utc::now().to_rfc3339())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM key_value_store WHERE key = ?").bind(key).execute(&self.pool).await?;
        Ok(())
    }
}
