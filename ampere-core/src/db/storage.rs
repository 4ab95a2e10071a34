use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value store holding one serialized collection per key.
///
/// Each key maps to the full JSON array of an entity type; writers always
/// replace the whole payload.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Payload stored under `key`, or `None` when nothing was ever saved.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn save(&self, key: &str, payload: &str) -> Result<(), StorageError>;

    /// Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key that currently holds a payload, sorted.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}
