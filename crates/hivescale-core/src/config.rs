//! hive.toml configuration parser.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so an empty document is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capacity::CapacityCurve;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HiveConfig {
    pub pool: PoolConfig,
    pub scaler: ScalerConfig,
    pub complexity: ComplexityConfig,
    pub coordinator: CoordinatorConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard cap on the number of agent records.
    pub max_agents: usize,
    /// Performance assigned to a freshly spawned agent.
    pub default_performance: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_agents: 12,
            default_performance: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScalerConfig {
    pub min_agents: usize,
    pub max_agents: usize,
    pub thresholds: CapacityCurve,
    pub scale_down: ScaleDownConfig,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            min_agents: 1,
            max_agents: 12,
            thresholds: CapacityCurve::default(),
            scale_down: ScaleDownConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleDownConfig {
    /// How long an agent must sit idle before it may be reclaimed ("30s").
    pub idle_timeout: String,
    pub max_remove_per_cycle: usize,
}

impl Default for ScaleDownConfig {
    fn default() -> Self {
        Self {
            idle_timeout: "30s".to_string(),
            max_remove_per_cycle: 2,
        }
    }
}

impl ScaleDownConfig {
    pub fn idle_timeout(&self) -> Duration {
        parse_duration(&self.idle_timeout).unwrap_or(Duration::from_secs(30))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComplexityConfig {
    pub weights: ComplexityWeights,
}

/// Weights of the five scored signals in the complexity sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComplexityWeights {
    pub description: f64,
    pub file_count: f64,
    pub dependencies: f64,
    pub code_complexity: f64,
    pub cross_cutting: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            description: 0.35,
            file_count: 0.25,
            dependencies: 0.25,
            code_complexity: 0.10,
            cross_cutting: 0.05,
        }
    }
}

impl ComplexityWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.description,
            self.file_count,
            self.dependencies,
            self.code_complexity,
            self.cross_cutting,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Prefix for every key written to the coordination store.
    pub namespace: String,
    pub auto_scale_enabled: bool,
    /// Idle agents below this performance are dropped by `optimize_pool`.
    pub underperformer_threshold: f64,
    /// Period of the background scale-down loop ("30s").
    pub scale_down_interval: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            namespace: "coordination/scaling".to_string(),
            auto_scale_enabled: true,
            underperformer_threshold: 0.5,
            scale_down_interval: "30s".to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn scale_down_interval(&self) -> Duration {
        parse_duration(&self.scale_down_interval).unwrap_or(Duration::from_secs(30))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Redb,
    #[default]
    Memory,
    Noop,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the redb backend.
    pub path: Option<PathBuf>,
}

impl HiveConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        debug!(
            path = %path.display(),
            max_agents = config.pool.max_agents,
            namespace = %config.coordinator.namespace,
            "hive config loaded"
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: HiveConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the scaler cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pool.max_agents == 0 {
            bail!("pool.max_agents must be at least 1");
        }
        if self.scaler.min_agents > self.scaler.max_agents {
            bail!(
                "scaler.min_agents ({}) exceeds scaler.max_agents ({})",
                self.scaler.min_agents,
                self.scaler.max_agents
            );
        }
        if !self.scaler.thresholds.is_well_formed() {
            bail!(
                "scaler.thresholds must satisfy mid < medium < high < 100, got {:?}",
                self.scaler.thresholds
            );
        }
        if self.complexity.weights.as_array().iter().any(|w| *w < 0.0 || !w.is_finite()) {
            bail!("complexity.weights must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.pool.default_performance) {
            bail!("pool.default_performance must be within 0.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.coordinator.underperformer_threshold) {
            bail!("coordinator.underperformer_threshold must be within 0.0..=1.0");
        }
        if parse_duration(&self.scaler.scale_down.idle_timeout).is_none() {
            bail!("invalid scaler.scale_down.idle_timeout: {}", self.scaler.scale_down.idle_timeout);
        }
        if parse_duration(&self.coordinator.scale_down_interval).is_none() {
            bail!(
                "invalid coordinator.scale_down_interval: {}",
                self.coordinator.scale_down_interval
            );
        }
        if self.store.backend == StoreBackend::Redb && self.store.path.is_none() {
            bail!("store.path is required for the redb backend");
        }
        Ok(())
    }

    /// A commented hive.toml with every default spelled out.
    pub fn scaffold() -> String {
        r#"# hivescale configuration

[pool]
max_agents = 12
default_performance = 0.75

[scaler]
min_agents = 1
max_agents = 12

# Score bands of the capacity curve (mid < medium < high < 100).
[scaler.thresholds]
mid = 50
medium = 70
high = 85

[scaler.scale_down]
idle_timeout = "30s"
max_remove_per_cycle = 2

[complexity.weights]
description = 0.35
file_count = 0.25
dependencies = 0.25
code_complexity = 0.10
cross_cutting = 0.05

[coordinator]
namespace = "coordination/scaling"
auto_scale_enabled = true
underperformer_threshold = 0.5
scale_down_interval = "30s"

# backend = "memory" | "redb" | "noop"
[store]
backend = "memory"
# path = "/var/lib/hivescale/coordination.redb"
"#
        .to_string()
    }
}

/// Parse a duration string like "250ms", "30s", "5m", or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
