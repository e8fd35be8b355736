//! hivescale-complexity — rates incoming work on a 0–100 scale.
//!
//! The detector is a pure function of the task descriptor: no state, no
//! I/O, never fails. Missing fields count as empty.
//!
//! # Scoring
//!
//! ```text
//! total = 0.35 * description      keyword tiers + length bonus
//!       + 0.25 * file_count       step function + infra artifacts
//!       + 0.25 * dependencies     count + operationally complex names
//!       + 0.10 * code_complexity  caller hint, passed through
//!       + 0.05 * cross_cutting    20 when flagged
//!       + parallelizable bonus    +15, outside the weights
//!       + bonus rules             joint signals, e.g. deployment (+3)
//! score = clamp(round(total), 0, 100)
//! ```

pub mod detector;
pub mod vocabulary;

pub use detector::{BonusRule, ComplexityDetector, ComplexityMetrics};
