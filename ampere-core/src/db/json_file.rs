use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use super::factory::{StorageConfig, StorageFactory};
use super::storage::{SnapshotStorage, StorageError};

const EXTENSION: &str = "json";

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Open `dir`, creating it when missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(
        &self,
        key: &str,
    ) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::Configuration(format!("invalid storage key '{key}'")))
    }
}

#[async_trait]
impl SnapshotStorage for JsonFileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &path).await?;
        tracing::trace!(path = %path.display(), bytes = payload.len(), "snapshot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }
}

/// `connection_string` is the snapshot directory.
pub struct JsonFileStorageFactory;

#[async_trait]
impl StorageFactory for JsonFileStorageFactory {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn create(
        &self,
        config: &StorageConfig,
    ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
        if config.connection_string.trim().is_empty() {
            return Err(StorageError::Configuration(
                "json backend needs a directory".to_string(),
            ));
        }
        let storage = JsonFileStorage::open(&config.connection_string).await?;
        Ok(Arc::new(storage))
    }
}
