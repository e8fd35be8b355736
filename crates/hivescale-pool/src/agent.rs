//! Agent records and the request/response types around them.

use serde::{Deserialize, Serialize};

use hivescale_core::{AgentId, AgentStatus, AgentType, TaskId};

/// Token identifying one consumer (a scaler) of a shared pool.
pub type OwnerId = u64;

/// Snapshot of one agent record.
///
/// Returned by value from every pool read; mutating a snapshot has no
/// effect on the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    /// Rolling quality estimate in 0.0..=1.0.
    pub performance: f64,
    /// Epoch milliseconds at spawn.
    pub spawned_at: u64,
    /// Epoch milliseconds of the last activation or release.
    pub last_active: u64,
    pub tasks_completed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<TaskId>,
    /// Monotonic spawn position within the pool.
    pub spawn_seq: u64,
    /// Scaler currently holding this agent in its working set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerId>,
}

impl Agent {
    pub fn is_idle(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Milliseconds since the agent was last active, as seen at `now_ms`.
    pub fn idle_for_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_active)
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            id: self.id.clone(),
            agent_type: self.agent_type,
            performance: self.performance,
        }
    }
}

/// Minimal reference to an allocated agent, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHandle {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub performance: f64,
}

/// Parameters for [`AgentPool::spawn_agent`](crate::AgentPool::spawn_agent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Explicit id; generated as `{type}-{seq}` when absent.
    pub id: Option<AgentId>,
    pub agent_type: Option<AgentType>,
    /// Initial performance; the pool default when absent.
    pub performance: Option<f64>,
}

impl SpawnConfig {
    pub fn of_type(agent_type: AgentType) -> Self {
        Self {
            agent_type: Some(agent_type),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<AgentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_performance(mut self, performance: f64) -> Self {
        self.performance = Some(performance);
        self
    }
}

/// Result of one finished task as reported by its agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TaskOutcome {
    pub fn succeeded(duration_ms: u64) -> Self {
        Self {
            success: true,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn failed(duration_ms: u64) -> Self {
        Self {
            success: false,
            duration_ms: Some(duration_ms),
        }
    }
}

/// Filter and ranking options for [`AgentPool::select_agents`](crate::AgentPool::select_agents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Maximum number of agents to return; all matches when absent.
    pub count: Option<usize>,
    pub agent_type: Option<AgentType>,
    /// Narrow to idle agents when at least one idle agent matches.
    pub prefer_idle: bool,
    /// Inclusive lower bound on performance.
    pub min_performance: f64,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            count: None,
            agent_type: None,
            prefer_idle: true,
            min_performance: 0.0,
        }
    }
}

impl SelectionCriteria {
    /// Type and performance filter. `prefer_idle` is applied by the pool
    /// over the whole candidate set, not per agent.
    pub fn matches(&self, agent: &Agent) -> bool {
        if let Some(t) = self.agent_type {
            if agent.agent_type != t {
                return false;
            }
        }
        agent.performance >= self.min_performance
    }
}
