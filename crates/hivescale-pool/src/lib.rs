//! hivescale-pool — the bounded registry of agent records.
//!
//! The pool owns every agent record and its performance counters. It
//! knows nothing about scaling policy; scalers drive it through
//! [`AgentPool::acquire`] and the removal methods.
//!
//! # Architecture
//!
//! ```text
//! AgentPool
//!   ├── Mutex<PoolInner>          (sole shared mutable state)
//!   │     ├── records: id → { Agent, PerformanceMetrics }
//!   │     └── next_seq            (spawn order, tie-breaks)
//!   └── SharedClock               (lastActive / idle predicates)
//! ```
//!
//! Every mutation, including "pick idle agents then mark them active",
//! runs inside one critical section, so concurrent callers can neither
//! overshoot `max_agents` nor hand the same idle agent to two tasks.

pub mod agent;
pub mod error;
pub mod performance;
pub mod pool;

pub use agent::{Agent, AgentHandle, OwnerId, SelectionCriteria, SpawnConfig, TaskOutcome};
pub use error::{PoolError, PoolResult};
pub use performance::{AgentMetricsSummary, PerformanceMetrics};
pub use pool::{Acquisition, AgentPool, PoolStats};
