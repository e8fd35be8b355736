//! Complexity detector — weighted scoring of task descriptors.
//!
//! Evaluates a task using a weighted combination of:
//! - **Description**: keyword tiers and length
//! - **File count**: how many files the task touches, infra artifacts count extra
//! - **Dependencies**: how many, and how operationally heavy they are
//! - **Code complexity**: the caller's own estimate
//! - **Cross-cutting**: whether the change spans layers
//!
//! plus flat bonuses that sit outside the weighted sum.

use serde::{Deserialize, Serialize};
use tracing::warn;

use hivescale_core::config::ComplexityWeights;
use hivescale_core::{CapacityCurve, ComplexityLevel, Task};

use crate::vocabulary::*;

/// Breakdown of a task's complexity, before clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub description_score: u32,
    pub file_count_score: u32,
    pub dependency_score: u32,
    pub code_complexity_score: u32,
    pub cross_cutting_score: u32,
    pub parallelizable_bonus: u32,
    /// Sum of all triggered bonus rules.
    pub rule_bonus: u32,
    /// Names of the bonus rules that fired.
    pub triggered_rules: Vec<String>,
    /// Weighted sum plus bonuses, unrounded and unclamped.
    pub total_score: f64,
}

impl ComplexityMetrics {
    /// Final 0–100 score.
    pub fn score(&self) -> u32 {
        self.total_score.round().clamp(0.0, 100.0) as u32
    }
}

/// A joint-signal bonus: fires when the description mentions one of
/// `description_terms` AND a file path contains one of `file_markers`.
///
/// An empty term or marker list matches everything on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub name: String,
    pub description_terms: Vec<String>,
    pub file_markers: Vec<String>,
    pub points: u32,
}

impl BonusRule {
    /// Deployment work that ships its own deployment config (+3).
    pub fn deployment() -> Self {
        Self {
            name: "deployment".to_string(),
            description_terms: DEPLOYMENT_TERMS.iter().map(|s| s.to_string()).collect(),
            file_markers: DEPLOYMENT_CONFIG_MARKERS.iter().map(|s| s.to_string()).collect(),
            points: 3,
        }
    }

    fn applies(&self, description: &str, files: &[String]) -> bool {
        let term_hit = self.description_terms.is_empty()
            || self
                .description_terms
                .iter()
                .any(|t| description.contains(&t.to_lowercase()));
        let file_hit = self.file_markers.is_empty()
            || files.iter().any(|f| {
                let f = f.to_lowercase();
                self.file_markers.iter().any(|m| f.contains(&m.to_lowercase()))
            });
        term_hit && file_hit
    }
}

/// Scores tasks. Stateless apart from its (immutable) tuning.
#[derive(Debug, Clone)]
pub struct ComplexityDetector {
    weights: ComplexityWeights,
    rules: Vec<BonusRule>,
    curve: CapacityCurve,
}

impl Default for ComplexityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexityDetector {
    /// Detector with default weights and the deployment bonus rule.
    pub fn new() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            rules: vec![BonusRule::deployment()],
            curve: CapacityCurve::default(),
        }
    }

    pub fn with_weights(mut self, weights: ComplexityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Append a bonus rule. Rules are evaluated in insertion order.
    pub fn with_rule(mut self, rule: BonusRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Capacity curve used by [`recommend_agent_count`](Self::recommend_agent_count).
    pub fn with_curve(mut self, curve: CapacityCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn weights(&self) -> &ComplexityWeights {
        &self.weights
    }

    pub fn rules(&self) -> &[BonusRule] {
        &self.rules
    }

    /// Score a task on the 0–100 scale.
    pub fn score_task(&self, task: &Task) -> u32 {
        self.complexity_metrics(task).score()
    }

    /// Full breakdown of a task's score.
    pub fn complexity_metrics(&self, task: &Task) -> ComplexityMetrics {
        if task.code_complexity.is_some_and(|c| c > 100) {
            warn!(
                task = %task.id,
                code_complexity = ?task.code_complexity,
                "code complexity hint out of range, clamping to 100"
            );
        }

        let description = task.description.to_lowercase();
        let description_score = score_description(&description);
        let file_count_score = score_files(&task.files);
        let dependency_score = score_dependencies(&task.dependencies);
        let code_complexity_score = task.code_complexity_hint();
        let cross_cutting_score = if task.cross_cutting { CROSS_CUTTING_SCORE } else { 0 };
        let parallelizable_bonus = if task.parallelizable { PARALLELIZABLE_BONUS } else { 0 };

        let mut triggered_rules = Vec::new();
        let mut rule_bonus = 0;
        for rule in &self.rules {
            if rule.applies(&description, &task.files) {
                rule_bonus += rule.points;
                triggered_rules.push(rule.name.clone());
            }
        }

        let w = &self.weights;
        let weighted = f64::from(description_score) * w.description
            + f64::from(file_count_score) * w.file_count
            + f64::from(dependency_score) * w.dependencies
            + f64::from(code_complexity_score) * w.code_complexity
            + f64::from(cross_cutting_score) * w.cross_cutting;

        ComplexityMetrics {
            description_score,
            file_count_score,
            dependency_score,
            code_complexity_score,
            cross_cutting_score,
            parallelizable_bonus,
            rule_bonus,
            triggered_rules,
            total_score: weighted + f64::from(parallelizable_bonus) + f64::from(rule_bonus),
        }
    }

    /// Classify a score into a complexity level.
    pub fn classify(&self, score: u32) -> ComplexityLevel {
        ComplexityLevel::from_score(score)
    }

    /// Advisory agent count for a score, clamped to `[min, max]`.
    pub fn recommend_agent_count(&self, score: u32, min: usize, max: usize) -> usize {
        self.curve.required_agents(score, min, max)
    }
}

/// Keyword tiers plus length bonus, clamped to 0..=100.
fn score_description(description: &str) -> u32 {
    let mut score: i32 = 0;
    for tier in DESCRIPTION_TIERS {
        score += count_matches(description, tier.keywords) as i32 * tier.points;
        score = score.max(0);
    }

    let words = description.split_whitespace().count();
    if words > LONG_DESCRIPTION_WORDS {
        score += LONG_DESCRIPTION_BONUS;
    }
    if words > VERY_LONG_DESCRIPTION_WORDS {
        score += VERY_LONG_DESCRIPTION_BONUS;
    }

    score.clamp(0, 100) as u32
}

/// Step function on file count plus infra artifacts, clamped to 0..=100.
fn score_files(files: &[String]) -> u32 {
    let base = match files.len() {
        0 => 0,
        1 => 10,
        2..=3 => 25,
        4..=5 => 40,
        6..=10 => 60,
        11..=15 => 80,
        _ => 100,
    };
    let infra = files
        .iter()
        .filter(|f| contains_any(f, INFRA_FILE_MARKERS))
        .count() as u32;

    (base + infra * INFRA_FILE_POINTS).min(100)
}

/// Dependency count plus operationally complex names, clamped to 0..=100.
fn score_dependencies(deps: &[String]) -> u32 {
    let base = (deps.len() as u32)
        .saturating_mul(DEPENDENCY_POINTS_EACH)
        .min(DEPENDENCY_COUNT_CAP);
    let complex = deps
        .iter()
        .filter(|d| contains_any(d, COMPLEX_DEPENDENCIES))
        .count() as u32;

    base.saturating_add(complex.saturating_mul(COMPLEX_DEPENDENCY_POINTS)).min(100)
}
