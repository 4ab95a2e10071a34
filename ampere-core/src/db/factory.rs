use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::json_file::JsonFileStorageFactory;
use super::memory::MemoryStorageFactory;
use super::storage::{SnapshotStorage, StorageError};

/// Backend-agnostic storage configuration.
///
/// `backend` must match the [`StorageFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is backend-specific.
///
/// | backend  | connection_string examples          |
/// |----------|-------------------------------------|
/// | `memory` | ignored                             |
/// | `json`   | `data`, `/var/lib/ampere`           |
/// | `sqlite` | `ampere.db`, `:memory:`             |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"json"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            connection_string: "data".to_string(),
        }
    }
}

/// One implementation per storage backend, registered with a
/// [`StorageRegistry`] at startup.
#[async_trait]
pub trait StorageFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the backend. Implementations may create
    /// directories or run migrations here.
    async fn create(
        &self,
        config: &StorageConfig,
    ) -> Result<Arc<dyn SnapshotStorage>, StorageError>;
}

/// Registry of [`StorageFactory`] instances, keyed by backend name.
pub struct StorageRegistry {
    factories: HashMap<&'static str, Box<dyn StorageFactory>>,
}

impl StorageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the backends that live in this crate (`memory`, `json`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MemoryStorageFactory));
        registry.register(Box::new(JsonFileStorageFactory));
        registry
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(&mut self, factory: Box<dyn StorageFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`StorageError::Configuration`] when no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &StorageConfig,
    ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                StorageError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        tracing::debug!(backend = %config.backend, "opening storage");
        factory.create(config).await
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::{SnapshotStorage, StorageConfig, StorageError, StorageFactory, StorageRegistry};
    use crate::db::MemoryStorage;

    // ── stub factory ─────────────────────────────────────────────────────
    /// Flips `called` and hands back an empty in-memory store.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StorageFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &StorageConfig,
        ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Arc::new(MemoryStorage::new()))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl StorageFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &StorageConfig,
        ) -> Result<Arc<dyn SnapshotStorage>, StorageError> {
            Err(StorageError::Connection("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn StorageFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> StorageConfig {
        StorageConfig {
            backend: backend.to_string(),
            connection_string: "x".to_string(),
        }
    }

    // ── StorageConfig ────────────────────────────────────────────────────
    #[test]
    fn config_default_is_json_data_dir() {
        let cfg = StorageConfig::default();
        assert_eq!(cfg.backend, "json");
        assert_eq!(cfg.connection_string, "data");
    }

    // ── registry construction ────────────────────────────────────────────
    #[test]
    fn new_registry_has_no_backends() {
        assert!(StorageRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn builtin_registry_knows_memory_and_json() {
        assert_eq!(StorageRegistry::with_builtin().available_backends(), vec!["json", "memory"]);
    }

    // ── registration ─────────────────────────────────────────────────────
    #[test]
    fn available_backends_is_sorted() {
        let mut reg = StorageRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("json");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["json", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = StorageRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = StorageRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (json, json_called) = stub_factory("json");
        reg.register(sqlite);
        reg.register(json);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!json_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn configuration_error_names_requested_and_available_backends() {
        let mut reg = StorageRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(StorageError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("sqlite"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a storage"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = StorageRegistry::new();
        reg.register(Box::new(FailingFactory));

        assert!(matches!(
            reg.create(&config("failing")).await,
            Err(StorageError::Connection(msg)) if msg == "intentional failure"
        ));
    }
}
