//! Per-agent task history and the derived performance score.
//!
//! ```text
//! performance = success_rate * 0.7 + max(0, 1 - avg_ms / 10_000) * 0.3
//! avg_ms      = total_duration_ms / total_tasks
//! ```
//!
//! A task reported without a duration counts toward `total_tasks` but adds
//! nothing to `total_duration_ms`, so it pulls the average down.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::agent::TaskOutcome;

/// Number of recent durations retained per agent.
pub const DURATION_WINDOW: usize = 100;

const SUCCESS_WEIGHT: f64 = 0.7;
const SPEED_WEIGHT: f64 = 0.3;
/// Average duration at which the speed term reaches zero.
const SLOW_TASK_MS: f64 = 10_000.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub total_duration_ms: u64,
    durations: VecDeque<u64>,
}

impl PerformanceMetrics {
    pub fn record(&mut self, outcome: TaskOutcome) {
        self.total_tasks += 1;
        if outcome.success {
            self.successful_tasks += 1;
        } else {
            self.failed_tasks += 1;
        }
        if let Some(ms) = outcome.duration_ms {
            self.total_duration_ms = self.total_duration_ms.saturating_add(ms);
            if self.durations.len() == DURATION_WINDOW {
                self.durations.pop_front();
            }
            self.durations.push_back(ms);
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.successful_tasks as f64 / self.total_tasks as f64
    }

    pub fn average_duration_ms(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.total_duration_ms as f64 / self.total_tasks as f64
    }

    /// Derived score, or `None` before the first recorded task.
    pub fn performance(&self) -> Option<f64> {
        if self.total_tasks == 0 {
            return None;
        }
        let speed = (1.0 - self.average_duration_ms() / SLOW_TASK_MS).max(0.0);
        Some((self.success_rate() * SUCCESS_WEIGHT + speed * SPEED_WEIGHT).clamp(0.0, 1.0))
    }

    /// Most recent durations, oldest first.
    pub fn recent_durations(&self) -> impl Iterator<Item = u64> + '_ {
        self.durations.iter().copied()
    }
}

/// Read-only summary returned by `AgentPool::agent_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetricsSummary {
    pub tasks_completed: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
    /// Durations of the most recent tasks, oldest first, at most
    /// [`DURATION_WINDOW`] entries.
    pub recent_durations_ms: Vec<u64>,
    pub performance: f64,
}
