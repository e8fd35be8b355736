//! hivescale-metrics — observability surface for the scaler.
//!
//! ```text
//! ScalerStats ──┐
//!               ├── render_prometheus() → text/plain for a /metrics endpoint
//! [Agent]     ──┘
//! ```
//!
//! Gauges describe the current working set and pool; counters mirror the
//! scaler's cumulative event counts.

pub mod prometheus;

pub use prometheus::render_prometheus;
