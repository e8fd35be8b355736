//! Pool error types.

use thiserror::Error;

/// Errors from capacity-bounded pool mutations.
///
/// Only spawning can fail; reads, status changes, and removals are total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("agent pool at maximum capacity: {max}")]
    CapacityExceeded { max: usize },

    #[error("agent id already in pool: {0}")]
    DuplicateAgent(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
