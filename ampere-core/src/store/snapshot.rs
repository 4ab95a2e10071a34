//! Whole-collection reads and writes.
//!
//! Storage failures never reach callers: the in-memory collection stays
//! authoritative and the failure is logged.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::SnapshotStorage;

/// What was found under a key when a store opened.
#[derive(Debug)]
pub(crate) enum Loaded<T> {
    /// Nothing was ever saved under the key.
    Missing,
    Found(Vec<T>),
    /// Unreadable storage or a malformed payload.
    Failed,
}

impl<T> Loaded<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Loaded::Found(items) => items,
            Loaded::Missing | Loaded::Failed => Vec::new(),
        }
    }
}

pub(crate) async fn load<T: DeserializeOwned>(
    storage: &dyn SnapshotStorage,
    key: &str,
) -> Loaded<T> {
    let payload = match storage.load(key).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::debug!(key, "no snapshot stored yet");
            return Loaded::Missing;
        }
        Err(e) => {
            tracing::error!(key, error = %e, "failed to read snapshot");
            return Loaded::Failed;
        }
    };

    match serde_json::from_str::<Vec<T>>(&payload) {
        Ok(items) => {
            tracing::debug!(key, count = items.len(), "snapshot loaded");
            Loaded::Found(items)
        }
        Err(e) => {
            tracing::error!(key, error = %e, "malformed snapshot, starting empty");
            Loaded::Failed
        }
    }
}

/// Returns whether the snapshot reached storage.
pub(crate) async fn save<T: Serialize>(
    storage: &dyn SnapshotStorage,
    key: &str,
    items: &[T],
) -> bool {
    let payload = match serde_json::to_string(items) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to serialize snapshot");
            return false;
        }
    };

    match storage.save(key, &payload).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to persist snapshot");
            false
        }
    }
}
