//! Domain types shared across hivescale crates.
//!
//! A `Task` is an opaque descriptor of incoming work; agents are logical
//! worker slots identified by id and role. All types serialize to JSON so
//! they can travel through the coordination store and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a task as supplied by the caller.
pub type TaskId = String;

/// Identifier of an agent, unique within its pool.
pub type AgentId = String;

// ── Task ──────────────────────────────────────────────────────────

/// Incoming unit of work to be scored and staffed.
///
/// Every field except `id` is optional on the wire; missing fields default
/// to empty/0/false so scoring never fails on a sparse descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub files: Vec<String>,
    pub dependencies: Vec<String>,
    /// Caller-supplied code complexity hint (0–100).
    #[serde(alias = "codeComplexity")]
    pub code_complexity: Option<u32>,
    #[serde(alias = "crossCutting")]
    pub cross_cutting: bool,
    pub parallelizable: bool,
    /// Pre-computed complexity score. When present the scaler uses it
    /// instead of running the detector.
    #[serde(alias = "complexityScore", skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<u32>,
}

impl Task {
    /// Create a task with an id and a description.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Create an otherwise empty task carrying only a pre-computed score.
    pub fn with_score(id: impl Into<String>, score: u32) -> Self {
        Self {
            id: id.into(),
            complexity_score: Some(score),
            ..Self::default()
        }
    }

    pub fn files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn code_complexity(mut self, hint: u32) -> Self {
        self.code_complexity = Some(hint);
        self
    }

    pub fn cross_cutting(mut self, flag: bool) -> Self {
        self.cross_cutting = flag;
        self
    }

    pub fn parallelizable(mut self, flag: bool) -> Self {
        self.parallelizable = flag;
        self
    }

    /// Code complexity hint clamped into 0..=100.
    pub fn code_complexity_hint(&self) -> u32 {
        self.code_complexity.unwrap_or(0).min(100)
    }

    /// Pre-computed score clamped into 0..=100, if any.
    pub fn precomputed_score(&self) -> Option<u32> {
        self.complexity_score.map(|s| s.min(100))
    }
}

// ── Agents ────────────────────────────────────────────────────────

/// Fixed role vocabulary for agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Researcher,
    Coder,
    Tester,
    Reviewer,
    Architect,
    Optimizer,
    Coordinator,
    Analyst,
}

impl AgentType {
    pub const ALL: [AgentType; 8] = [
        AgentType::Researcher,
        AgentType::Coder,
        AgentType::Tester,
        AgentType::Reviewer,
        AgentType::Architect,
        AgentType::Optimizer,
        AgentType::Coordinator,
        AgentType::Analyst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Researcher => "researcher",
            AgentType::Coder => "coder",
            AgentType::Tester => "tester",
            AgentType::Reviewer => "reviewer",
            AgentType::Architect => "architect",
            AgentType::Optimizer => "optimizer",
            AgentType::Coordinator => "coordinator",
            AgentType::Analyst => "analyst",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a role name outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown agent type: {0}")]
pub struct UnknownAgentType(pub String);

impl FromStr for AgentType {
    type Err = UnknownAgentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AgentType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| UnknownAgentType(s.to_string()))
    }
}

/// Lifecycle status of an agent. Exactly one at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Active,
}

// ── Complexity ────────────────────────────────────────────────────

/// Coarse classification of a 0–100 complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ComplexityLevel {
    /// Classify a score: low < 30 ≤ medium < 70 ≤ high < 90 ≤ critical.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => ComplexityLevel::Low,
            30..=69 => ComplexityLevel::Medium,
            70..=89 => ComplexityLevel::High,
            _ => ComplexityLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
