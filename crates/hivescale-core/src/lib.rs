//! hivescale-core — shared vocabulary for the hivescale crates.
//!
//! Holds the task descriptor consumed by the detector and scaler, the
//! fixed agent role vocabulary, the canonical score → capacity curve,
//! an injectable millisecond clock, and the `hive.toml` configuration.

pub mod capacity;
pub mod clock;
pub mod config;
pub mod types;

pub use capacity::CapacityCurve;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::HiveConfig;
pub use types::*;
