//! Process-local stores.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::error::StoreResult;
use crate::store::CoordinationStore;

/// Map-backed store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CoordinationStore for MemoryStore {
    fn store(&self, key: &str, value: &Value) -> StoreResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn retrieve(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Accepts every write and never returns anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl CoordinationStore for NoopStore {
    fn store(&self, _key: &str, _value: &Value) -> StoreResult<()> {
        Ok(())
    }

    fn retrieve(&self, _key: &str) -> StoreResult<Option<Value>> {
        Ok(None)
    }

    fn list_prefix(&self, _prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        Ok(Vec::new())
    }

    fn backend(&self) -> &'static str {
        "noop"
    }
}
