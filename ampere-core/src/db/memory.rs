use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::factory::{StorageConfig, StorageFactory};
use super::storage::{SnapshotStorage, StorageError};

/// Process-local storage. Reads and writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with `key -> payload`.
    pub fn with_entry(
        key: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        let storage = Self::new();
        storage.entries().insert(key.into(), payload.into());
        storage
    }

    pub fn fail_reads(
        &self,
        fail: bool,
    ) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(
        &self,
        fail: bool,
    ) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Synchronous peek for tests and diagnostics.
    pub fn payload(
        &self,
        key: &str,
    ) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("memory storage is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("memory storage is unreadable".to_string()));
        }
        Ok(self.entries().get(key).cloned())
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries().insert(key.to_string(), payload.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

pub struct MemoryStorageFactory;

#[async_trait]
impl StorageFactory for MemoryStorageFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StorageConfig,
    ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
        Ok(Arc::new(MemoryStorage::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let storage = MemoryStorage::new();

        storage.save("ampere_quotations", "[]").await.unwrap();

        assert_eq!(storage.load("ampere_quotations").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.load("missing").await.unwrap(), None);
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test]
    async fn failing_writes_leave_payload_untouched() {
        let storage = MemoryStorage::with_entry("k", "old");
        storage.fail_writes(true);

        let result = storage.save("k", "new").await;

        assert!(matches!(result, Err(StorageError::Connection(_))));
        assert_eq!(storage.payload("k").as_deref(), Some("old"));
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn failing_reads_surface_as_errors() {
        let storage = MemoryStorage::with_entry("k", "v");
        storage.fail_reads(true);

        assert!(storage.load("k").await.is_err());
    }

    #[tokio::test]
    async fn keys_are_sorted_and_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.save("b", "1").await.unwrap();
        storage.save("a", "2").await.unwrap();

        storage.remove("b").await.unwrap();
        storage.remove("b").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["a".to_string()]);
    }
}
