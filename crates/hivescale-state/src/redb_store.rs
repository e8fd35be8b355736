//! RedbStore — coordination records persisted with redb.
//!
//! Values are JSON documents serialized into redb's `&[u8]` value column.
//! The store is `Clone` (backed by `Arc<Database>`), so one handle can be
//! shared between the coordinator and a background loop.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::CoordinationStore;
use crate::tables::COORDINATION;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) a database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "coordination store opened");
        Ok(store)
    }

    /// Ephemeral store on redb's in-memory backend.
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory coordination store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(COORDINATION).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl CoordinationStore for RedbStore {
    fn store(&self, key: &str, value: &Value) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(COORDINATION).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, bytes = bytes.len(), "coordination record stored");
        Ok(())
    }

    fn retrieve(&self, key: &str) -> StoreResult<Option<Value>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(COORDINATION).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: Value =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(COORDINATION).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            let json: Value =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push((key.to_string(), json));
        }
        Ok(results)
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
