pub mod factory;
pub mod json_file;
pub mod memory;
pub mod storage;

pub use factory::{StorageConfig, StorageFactory, StorageRegistry};
pub use json_file::{JsonFileStorage, JsonFileStorageFactory};
pub use memory::{MemoryStorage, MemoryStorageFactory};
pub use storage::{SnapshotStorage, StorageError};
