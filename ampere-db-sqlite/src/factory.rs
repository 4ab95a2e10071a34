use std::sync::Arc;

use ampere_core::{SnapshotStorage, StorageConfig, StorageError, StorageFactory};
use async_trait::async_trait;

use crate::repository::SqliteStorage;

/// [`StorageFactory`] for SQLite.
///
/// Register this with a [`ampere_core::StorageRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use ampere_core::StorageRegistry;
/// use ampere_db_sqlite::SqliteStorageFactory;
///
/// let mut registry = StorageRegistry::with_builtin();
/// registry.register(Box::new(SqliteStorageFactory));
/// ```
pub struct SqliteStorageFactory;

#[async_trait]
impl StorageFactory for SqliteStorageFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` (a file
    /// path, `:memory:`, or a full `sqlite:` URL) and bring its schema up
    /// to date.
    async fn create(
        &self,
        config: &StorageConfig,
    ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
        let storage = SqliteStorage::new(&config.connection_string).await?;
        storage.run_migrations().await?;
        tracing::debug!(connection = %config.connection_string, "sqlite storage ready");
        Ok(Arc::new(storage))
    }
}

#[cfg(test)]
mod tests {
    use ampere_core::{StorageConfig, StorageFactory};

    use super::SqliteStorageFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteStorageFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_in_memory_storage() {
        let config = StorageConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let result = SqliteStorageFactory.create(&config).await;
        assert!(
            result.is_ok(),
            "failed to create in-memory storage: {:#?}",
            result.err()
        );
    }
}
