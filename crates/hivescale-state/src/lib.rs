//! hivescale-state — the coordination store.
//!
//! A namespaced JSON key/value store the scaling coordinator writes its
//! analyses, decisions, and status snapshots to. Scaling never depends on
//! it: every caller treats a store error as a logged warning.
//!
//! # Backends
//!
//! ```text
//! CoordinationStore (trait, object safe)
//!   ├── RedbStore    redb file or in-memory backend, one COORDINATION table
//!   ├── MemoryStore  RwLock<BTreeMap>, for tests and single-process hosts
//!   └── NoopStore    accepts writes, remembers nothing
//! ```
//!
//! Keys follow `{namespace}/{kind}-{id}`; values are JSON documents stored
//! as bytes, so prefix scans return related records in key order.

pub mod error;
pub mod memory;
pub mod redb_store;
pub mod store;
pub mod tables;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, NoopStore};
pub use redb_store::RedbStore;
pub use store::{CoordinationStore, SharedStore, get_json, open_store, put_json};
