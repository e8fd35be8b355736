//! The `CoordinationStore` seam and typed helpers over it.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use hivescale_core::config::{StoreBackend, StoreConfig};

use crate::error::{StoreError, StoreResult};
use crate::memory::{MemoryStore, NoopStore};
use crate::redb_store::RedbStore;

/// Namespaced JSON key/value persistence.
///
/// Implementations must be safe to share across threads; the coordinator
/// calls them from whichever thread is scaling.
pub trait CoordinationStore: Send + Sync {
    /// Insert or overwrite `key`.
    fn store(&self, key: &str, value: &Value) -> StoreResult<()>;

    fn retrieve(&self, key: &str) -> StoreResult<Option<Value>>;

    /// All records whose key starts with `prefix`, in key order.
    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Shared handle to a store.
pub type SharedStore = Arc<dyn CoordinationStore>;

/// Serialize `value` and store it under `key`.
pub fn put_json<T: Serialize + ?Sized>(
    store: &dyn CoordinationStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    store.store(key, &json)
}

/// Retrieve `key` and deserialize it into `T`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn CoordinationStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.retrieve(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Deserialize(e.to_string())),
        None => Ok(None),
    }
}

/// Open the backend selected by `[store]` in hive.toml.
pub fn open_store(config: &StoreConfig) -> StoreResult<SharedStore> {
    let store: SharedStore = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Noop => Arc::new(NoopStore),
        StoreBackend::Redb => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| StoreError::Open("redb backend requires store.path".to_string()))?;
            Arc::new(RedbStore::open(path)?)
        }
    };
    debug!(backend = store.backend(), "coordination store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        agents: usize,
        label: String,
    }

    #[test]
    fn typed_helpers_roundtrip_through_any_backend() {
        let store = MemoryStore::new();
        let snapshot = Snapshot {
            agents: 4,
            label: "busy".into(),
        };
        put_json(&store, "ns/status", &snapshot).unwrap();
        let back: Option<Snapshot> = get_json(&store, "ns/status").unwrap();
        assert_eq!(back, Some(snapshot));

        let missing: Option<Snapshot> = get_json(&store, "ns/other").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn get_json_reports_shape_mismatch() {
        let store = MemoryStore::new();
        store.store("ns/status", &json!({"agents": "many"})).unwrap();
        let err = get_json::<Snapshot>(&store, "ns/status").unwrap_err();
        assert!(matches!(err, StoreError::Deserialize(_)));
    }

    #[test]
    fn open_store_selects_backend() {
        let memory = open_store(&StoreConfig::default()).unwrap();
        assert_eq!(memory.backend(), "memory");

        let noop = open_store(&StoreConfig {
            backend: StoreBackend::Noop,
            path: None,
        })
        .unwrap();
        assert_eq!(noop.backend(), "noop");

        let dir = tempfile::tempdir().unwrap();
        let redb = open_store(&StoreConfig {
            backend: StoreBackend::Redb,
            path: Some(dir.path().join("coordination.redb")),
        })
        .unwrap();
        assert_eq!(redb.backend(), "redb");
    }

    #[test]
    fn redb_without_path_is_an_open_error() {
        let result = open_store(&StoreConfig {
            backend: StoreBackend::Redb,
            path: None,
        });
        assert!(matches!(result, Err(StoreError::Open(_))));
    }
}
