//! SQLite storage implementation

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use tracing::{debug, info};

use super::traits::{ApiKeyRecord, ApiKeyStorage};

/// SQLite-based API-key storage
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage
    pub async fn new(db_path: &str) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", db_path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let storage = Self { pool };
        storage.initialize().await?;

        Ok(storage)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_key (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key_name VARCHAR(100) NOT NULL UNIQUE,
                key_value VARCHAR(500) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("SQLite database initialized");
        Ok(())
    }

    /// Insert every configured key that does not exist yet
    pub async fn seed<'a, I>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut inserted = 0;
        for (name, value) in keys {
            if self.seed_key(name, value).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

fn record_from_row(row: &SqliteRow) -> ApiKeyRecord {
    ApiKeyRecord {
        id: row.get("id"),
        key_name: row.get("key_name"),
        key_value: row.get("key_value"),
    }
}

#[async_trait]
impl ApiKeyStorage for SqliteStorage {
    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let rows = sqlx::query("SELECT id, key_name, key_value FROM api_key ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn get_key(&self, key_name: &str) -> Result<Option<ApiKeyRecord>> {
        let row = sqlx::query("SELECT id, key_name, key_value FROM api_key WHERE key_name = ?")
            .bind(key_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn update_key(&self, key_name: &str, key_value: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE api_key SET key_value = ? WHERE key_name = ?")
            .bind(key_value)
            .bind(key_name)
            .execute(&self.pool)
            .await?;

        debug!("Updated API key {} ({} rows)", key_name, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    async fn seed_key(&self, key_name: &str, key_value: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO api_key (key_name, key_value) VALUES (?, ?)")
            .bind(key_name)
            .bind(key_value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    async fn open_storage(dir: &tempfile::TempDir) -> SqliteStorage {
        let db_path = dir.path().join("nested").join("api_key.db");
        SqliteStorage::new(db_path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&dir).await;

        assert!(storage.list_keys().await.unwrap().is_empty());

        // Seed
        assert!(storage.seed_key("weather_api", "old").await.unwrap());
        let record = storage.get_key("weather_api").await.unwrap().unwrap();
        assert_eq!(record.key_value, "old");

        // Update
        assert!(storage.update_key("weather_api", "abc123").await.unwrap());
        let record = storage.get_key("weather_api").await.unwrap().unwrap();
        assert_eq!(record.key_value, "abc123");

        // List
        let keys = storage.list_keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].key_name, "weather_api");
    }

    #[tokio::test]
    async fn test_update_missing_key_never_inserts() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&dir).await;

        assert!(!storage.update_key("weather_api", "abc123").await.unwrap());
        assert!(storage.get_key("weather_api").await.unwrap().is_none());
        assert!(storage.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&dir).await;
        storage.seed_key("maps_api", "v1").await.unwrap();

        assert!(storage.update_key("maps_api", "v2").await.unwrap());
        let first = storage.get_key("maps_api").await.unwrap();
        assert!(storage.update_key("maps_api", "v2").await.unwrap());
        let second = storage.get_key("maps_api").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_values() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&dir).await;

        let mut keys = BTreeMap::new();
        keys.insert("maps_api".to_string(), "seeded".to_string());
        keys.insert("weather_api".to_string(), "seeded".to_string());

        assert_eq!(storage.seed(&keys).await.unwrap(), 2);
        storage.update_key("maps_api", "rotated").await.unwrap();

        // Second startup: nothing inserted, nothing overwritten
        assert_eq!(storage.seed(&keys).await.unwrap(), 0);
        let record = storage.get_key("maps_api").await.unwrap().unwrap();
        assert_eq!(record.key_value, "rotated");
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let storage = open_storage(&dir).await;
            storage.seed_key("weather_api", "persisted").await.unwrap();
        }

        let storage = open_storage(&dir).await;
        let record = storage.get_key("weather_api").await.unwrap().unwrap();
        assert_eq!(record.key_value, "persisted");
    }
}
