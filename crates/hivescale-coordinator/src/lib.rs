//! hivescale-coordinator — the scaling front door.
//!
//! Wires the detector, scaler, and pool together and records what
//! happened in a coordination store.
//!
//! # Architecture
//!
//! ```text
//! ScalingCoordinator
//!   ├── analyze_and_scale(task)
//!   │     detector ──► {ns}/complexity-{task}
//!   │     scaler   ──► {ns}/decision-{task}, {ns}/status
//!   ├── scale_down / optimize_pool / rebalance_pool ──► {ns}/status
//!   ├── status / metrics / prometheus           (reads)
//!   ├── complete_task(agent, outcome)           (closes the loop)
//!   └── run(shutdown)                           periodic scale-down
//!
//! CoordinationStore writes are fire-and-forget: failures are logged
//! and never change the scaling result.
//! ```

pub mod coordinator;
pub mod report;

pub use coordinator::ScalingCoordinator;
pub use report::{
    AgentReport, AggregateMetrics, AnalyzeOutcome, ComplexityRecord, CoordinatorStatus,
    MetricsReport, OptimizeReport, RebalanceReport, ScaleDownReport, ScaleReport, ScalingDecision,
    StatusEvent, StatusRecord,
};
