//! hivescale-autoscale — complexity-driven agent scaling.
//!
//! Turns a task's complexity score into a target number of agents and
//! reconciles the scaler's working set against the shared pool.
//!
//! # Scaling Algorithm
//!
//! ```text
//! score    = task.complexity_score or detector.score_task(task)
//! required = capacity_curve(score) clamped to [min_agents, max_agents]
//!
//! drop tracked ids the pool no longer knows
//! if required < tracked:
//!     release idle tracked agents past idle_timeout, worst first,
//!     never below min_agents (agents stay in the pool, idle)
//! re-engage own idle agents, longest idle first
//! acquire the remainder from the pool: reuse idle, then spawn
//!     (type inferred from the description)
//! return the tracked agents that are active
//! ```
//!
//! `scale_down` is the reclaiming counterpart: it deletes tracked agents
//! that have sat idle past the timeout, lowest performance first, up to
//! `max_remove` and never below `min_agents`. Nothing here runs on a
//! timer; hosts call `scale_down` when they want capacity back.

pub mod inference;
pub mod scaler;

pub use inference::infer_agent_type;
pub use scaler::{Allocation, AutoScaler, ScaleDownOptions, ScalerStats, ScalingEvents};
