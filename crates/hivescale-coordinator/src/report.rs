//! Result and persisted record types of the coordinator.
//!
//! Everything here is plain serde data: the same structs are returned to
//! callers and written to the coordination store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hivescale_autoscale::ScalerStats;
use hivescale_complexity::ComplexityMetrics;
use hivescale_core::{AgentId, AgentType, ComplexityLevel, TaskId};
use hivescale_pool::{AgentHandle, AgentMetricsSummary, PoolStats};

/// Stored under `{ns}/complexity-{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityRecord {
    pub task_id: TaskId,
    pub score: u32,
    pub level: ComplexityLevel,
    pub metrics: ComplexityMetrics,
    pub timestamp: u64,
}

/// Stored under `{ns}/decision-{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingDecision {
    pub task_id: TaskId,
    pub complexity_score: u32,
    pub complexity_level: ComplexityLevel,
    pub required_agents: usize,
    pub agents_allocated: usize,
    pub agents: Vec<AgentHandle>,
    /// Fewer agents than required could be allocated.
    pub partial: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleReport {
    pub decision: ScalingDecision,
    pub metrics: ComplexityMetrics,
    /// Advisory count from the detector for the same score.
    pub recommendation: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalyzeOutcome {
    /// Auto-scaling is switched off; nothing was scored or allocated.
    Disabled { reason: String },
    Scaled(Box<ScaleReport>),
}

impl AnalyzeOutcome {
    pub fn report(&self) -> Option<&ScaleReport> {
        match self {
            AnalyzeOutcome::Scaled(report) => Some(report.as_ref()),
            AnalyzeOutcome::Disabled { .. } => None,
        }
    }

    pub fn is_scaled(&self) -> bool {
        matches!(self, AnalyzeOutcome::Scaled(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDownReport {
    pub removed: Vec<AgentId>,
    /// Agents still tracked by the scaler.
    pub remaining: usize,
    pub stats: ScalerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub threshold: f64,
    pub removed: Vec<AgentId>,
    pub remaining_agents: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub distribution: BTreeMap<AgentType, usize>,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub namespace: String,
    pub enabled: bool,
    pub underperformer_threshold: f64,
    pub stats: ScalerStats,
    pub pool: PoolStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    #[serde(flatten)]
    pub handle: AgentHandle,
    pub tasks_completed: u64,
    pub metrics: Option<AgentMetricsSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_agents: usize,
    pub active_agents: usize,
    pub total_tasks: u64,
    /// Mean performance over all agents; 0 for an empty pool.
    pub average_performance: f64,
}

/// Stored under `{ns}/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub agents: Vec<AgentReport>,
    pub aggregate: AggregateMetrics,
    pub scaling: ScalerStats,
    pub timestamp: u64,
}

/// What the last status-changing operation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum StatusEvent {
    ScaleUp {
        task_id: TaskId,
        complexity_score: u32,
        complexity_level: ComplexityLevel,
        agents_allocated: usize,
        agents: Vec<AgentHandle>,
    },
    ScaleDown {
        removed: Vec<AgentId>,
        remaining: usize,
    },
    Optimize {
        removed: usize,
    },
    Rebalance {
        distribution: BTreeMap<AgentType, usize>,
    },
}

/// Stored under `{ns}/status`; overwritten by each operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(flatten)]
    pub event: StatusEvent,
    pub last_updated: u64,
}
