use ampere_core::{SnapshotStorage, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Map a config connection string onto a sqlx URL.
///
/// * `:memory:` becomes `sqlite::memory:`
/// * anything already starting with `sqlite:` is passed through
/// * a bare path becomes `sqlite:{path}?mode=rwc` so the file is created
pub fn connection_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// Snapshots kept in a single `snapshots` table.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        let url = connection_url(connection_string);
        // Every pooled connection to `sqlite::memory:` is its own database.
        let max_connections = if url == "sqlite::memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect to {url}: {e}")))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to run migrations: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// When `key` was last written.
    pub async fn updated_at(
        &self,
        key: &str,
    ) -> Result<DateTime<Utc>, StorageError> {
        let row = sqlx::query("SELECT updated_at FROM snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        row.try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| StorageError::Database(format!("Failed to get updated_at: {e}")))
    }
}

#[async_trait]
impl SnapshotStorage for SqliteStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT payload FROM snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        row.map(|row| {
            row.try_get("payload")
                .map_err(|e| StorageError::Database(e.to_string()))
        })
        .transpose()
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO snapshots (key, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        tracing::trace!(key, bytes = payload.len(), "snapshot upserted");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT key FROM snapshots ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("key")
                    .map_err(|e| StorageError::Database(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let storage = SqliteStorage::new_with_pool(pool).await;
        storage
            .run_migrations()
            .await
            .expect("Failed to run migrations");
        storage
    }

    #[test]
    fn test_connection_url_mapping() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("ampere.db"), "sqlite:ampere.db?mode=rwc");
        assert_eq!(connection_url("sqlite:x.db?mode=ro"), "sqlite:x.db?mode=ro");
    }

    #[tokio::test]
    async fn test_load_missing_key() {
        let storage = setup_test_db().await;

        assert_eq!(storage.load("ampere_quotations").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites_payload() {
        let storage = setup_test_db().await;

        storage.save("ampere_quotations", "[]").await.unwrap();
        storage.save("ampere_quotations", "[{\"id\":\"1\"}]").await.unwrap();

        assert_eq!(
            storage.load("ampere_quotations").await.unwrap().as_deref(),
            Some("[{\"id\":\"1\"}]")
        );
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshots")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_keys_are_sorted() {
        let storage = setup_test_db().await;
        storage.save("ampere_quotations", "[]").await.unwrap();
        storage.save("ampere_purchase_orders", "[]").await.unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["ampere_purchase_orders", "ampere_quotations"]
        );
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let storage = setup_test_db().await;
        storage.save("k", "[]").await.unwrap();

        storage.remove("k").await.unwrap();
        storage.remove("k").await.unwrap();

        assert_eq!(storage.load("k").await.unwrap(), None);
        assert!(matches!(storage.updated_at("k").await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_updated_at_is_recorded() {
        let storage = setup_test_db().await;
        let before = Utc::now();

        storage.save("k", "[]").await.unwrap();

        assert!(storage.updated_at("k").await.unwrap() >= before);
    }
}
