//! ScalingCoordinator — per-task orchestration over detector, scaler,
//! and pool, with every outcome recorded in the coordination store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use hivescale_autoscale::{AutoScaler, ScaleDownOptions};
use hivescale_complexity::ComplexityDetector;
use hivescale_core::{AgentType, HiveConfig, SharedClock, SystemClock, Task};
use hivescale_pool::{AgentPool, TaskOutcome};
use hivescale_state::{SharedStore, get_json, put_json};

use crate::report::*;

/// Orchestrates scaling for a stream of tasks.
///
/// All methods take `&self`; the coordinator can be shared behind an
/// `Arc` between request handlers and the background [`run`](Self::run)
/// loop.
pub struct ScalingCoordinator {
    namespace: String,
    pool: Arc<AgentPool>,
    scaler: AutoScaler,
    store: SharedStore,
    auto_scale_enabled: AtomicBool,
    underperformer_threshold: RwLock<f64>,
    scale_down_interval: Duration,
    next_task: AtomicU64,
}

impl ScalingCoordinator {
    pub fn new(config: &HiveConfig, store: SharedStore) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Build the pool, detector, and scaler from `config`, reading time
    /// from `clock`.
    pub fn with_clock(config: &HiveConfig, store: SharedStore, clock: SharedClock) -> Self {
        let pool = Arc::new(AgentPool::from_config(&config.pool).with_clock(clock));
        let detector = ComplexityDetector::new()
            .with_weights(config.complexity.weights)
            .with_curve(config.scaler.thresholds);
        let scaler = AutoScaler::from_config(pool.clone(), detector, &config.scaler);

        info!(
            namespace = %config.coordinator.namespace,
            store = store.backend(),
            max_agents = config.pool.max_agents,
            min_agents = config.scaler.min_agents,
            "scaling coordinator ready"
        );

        Self {
            namespace: config.coordinator.namespace.clone(),
            pool,
            scaler,
            store,
            auto_scale_enabled: AtomicBool::new(config.coordinator.auto_scale_enabled),
            underperformer_threshold: RwLock::new(config.coordinator.underperformer_threshold),
            scale_down_interval: config.coordinator.scale_down_interval(),
            next_task: AtomicU64::new(1),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    pub fn scaler(&self) -> &AutoScaler {
        &self.scaler
    }

    pub fn auto_scale_enabled(&self) -> bool {
        self.auto_scale_enabled.load(Ordering::SeqCst)
    }

    /// Configured period of the background scale-down loop.
    pub fn scale_down_interval(&self) -> Duration {
        self.scale_down_interval
    }

    // ── Scaling ───────────────────────────────────────────────────

    /// Score `task`, persist the analysis, scale for it, persist the
    /// decision.
    ///
    /// A task carrying `complexity_score` keeps that score; the detector
    /// breakdown is still computed and stored. Tasks with an empty id are
    /// assigned `task-{n}`.
    pub fn analyze_and_scale(&self, task: &Task) -> AnalyzeOutcome {
        if !self.auto_scale_enabled() {
            debug!(task = %task.id, "auto-scaling disabled, skipping");
            return AnalyzeOutcome::Disabled {
                reason: "auto-scaling disabled".to_string(),
            };
        }

        let mut task = task.clone();
        if task.id.trim().is_empty() {
            task.id = format!("task-{}", self.next_task.fetch_add(1, Ordering::SeqCst));
        }

        let detector = self.scaler.detector();
        let metrics = detector.complexity_metrics(&task);
        let score = task.precomputed_score().unwrap_or_else(|| metrics.score());
        let level = detector.classify(score);

        self.persist(
            &format!("complexity-{}", task.id),
            &ComplexityRecord {
                task_id: task.id.clone(),
                score,
                level,
                metrics: metrics.clone(),
                timestamp: self.pool.now_ms(),
            },
        );

        let allocation = self.scaler.scale_with_score(&task, score);
        let handles = allocation.handles();
        let decision = ScalingDecision {
            task_id: task.id.clone(),
            complexity_score: score,
            complexity_level: level,
            required_agents: allocation.required,
            agents_allocated: handles.len(),
            agents: handles.clone(),
            partial: allocation.is_partial(),
            timestamp: self.pool.now_ms(),
        };
        if decision.partial {
            warn!(
                task = %task.id,
                required = decision.required_agents,
                allocated = decision.agents_allocated,
                "partial allocation, pool at capacity"
            );
        }

        self.persist(&format!("decision-{}", task.id), &decision);
        self.persist_status(StatusEvent::ScaleUp {
            task_id: task.id.clone(),
            complexity_score: score,
            complexity_level: level,
            agents_allocated: handles.len(),
            agents: handles,
        });

        let recommendation = detector.recommend_agent_count(
            score,
            self.scaler.min_agents(),
            self.scaler.max_agents(),
        );

        AnalyzeOutcome::Scaled(Box::new(ScaleReport {
            decision,
            metrics,
            recommendation,
        }))
    }

    /// Reclaim idle capacity and persist what was removed.
    pub fn scale_down(&self, options: ScaleDownOptions) -> ScaleDownReport {
        let removed = self.scaler.scale_down(options);
        let remaining = self.scaler.active_agent_count();
        self.persist_status(StatusEvent::ScaleDown {
            removed: removed.clone(),
            remaining,
        });
        ScaleDownReport {
            removed,
            remaining,
            stats: self.scaler.stats(),
        }
    }

    /// Drop idle agents below the configured performance threshold.
    pub fn optimize_pool(&self) -> OptimizeReport {
        let threshold = *self
            .underperformer_threshold
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = self.pool.remove_underperformers(threshold);
        self.persist_status(StatusEvent::Optimize {
            removed: removed.len(),
        });
        OptimizeReport {
            threshold,
            removed,
            remaining_agents: self.pool.pool_size(),
        }
    }

    /// Move the pool's type mix toward `desired`.
    pub fn rebalance_pool(&self, desired: &BTreeMap<AgentType, usize>) -> RebalanceReport {
        let distribution = self.pool.rebalance_pool(desired);
        self.persist_status(StatusEvent::Rebalance {
            distribution: distribution.clone(),
        });
        RebalanceReport {
            distribution,
            pool_size: self.pool.pool_size(),
        }
    }

    /// Record a finished task and return the agent to idle.
    ///
    /// Returns the agent's new performance, or `None` if the agent is no
    /// longer in the pool.
    pub fn complete_task(&self, agent_id: &str, outcome: TaskOutcome) -> Option<f64> {
        let performance = self.pool.record_task_completion(agent_id, outcome)?;
        self.pool.mark_idle(agent_id);
        debug!(agent = %agent_id, success = outcome.success, performance, "task completed");
        Some(performance)
    }

    // ── Reads ─────────────────────────────────────────────────────

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            namespace: self.namespace.clone(),
            enabled: self.auto_scale_enabled(),
            underperformer_threshold: *self
                .underperformer_threshold
                .read()
                .unwrap_or_else(PoisonError::into_inner),
            stats: self.scaler.stats(),
            pool: self.pool.stats(),
        }
    }

    /// Per-agent and aggregate metrics; also persisted under `{ns}/metrics`.
    pub fn metrics(&self) -> MetricsReport {
        let agents = self.pool.all_agents();
        let total_tasks = agents.iter().map(|a| a.tasks_completed).sum();
        let average_performance = if agents.is_empty() {
            0.0
        } else {
            agents.iter().map(|a| a.performance).sum::<f64>() / agents.len() as f64
        };

        let report = MetricsReport {
            aggregate: AggregateMetrics {
                total_agents: agents.len(),
                active_agents: agents.iter().filter(|a| a.is_active()).count(),
                total_tasks,
                average_performance,
            },
            agents: agents
                .iter()
                .map(|a| AgentReport {
                    handle: a.handle(),
                    tasks_completed: a.tasks_completed,
                    metrics: self.pool.agent_metrics(&a.id),
                })
                .collect(),
            scaling: self.scaler.stats(),
            timestamp: self.pool.now_ms(),
        };
        self.persist("metrics", &report);
        report
    }

    /// Prometheus exposition of the scaler and pool.
    pub fn prometheus(&self) -> String {
        hivescale_metrics::render_prometheus(
            &self.namespace,
            &self.scaler.stats(),
            &self.pool.all_agents(),
        )
    }

    /// The persisted analysis for `task_id`, if the store has it.
    pub fn complexity_analysis(&self, task_id: &str) -> Option<ComplexityRecord> {
        let key = self.key(&format!("complexity-{task_id}"));
        match get_json(self.store.as_ref(), &key) {
            Ok(record) => record,
            Err(e) => {
                warn!(%key, error = %e, "failed to read complexity analysis");
                None
            }
        }
    }

    // ── Settings ──────────────────────────────────────────────────

    /// Switch auto-scaling on or off and persist the setting.
    pub fn set_auto_scale(&self, enabled: bool) {
        self.auto_scale_enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "auto-scaling toggled");
        self.persist_settings();
    }

    pub fn set_underperformer_threshold(&self, threshold: f64) {
        *self
            .underperformer_threshold
            .write()
            .unwrap_or_else(PoisonError::into_inner) = threshold.clamp(0.0, 1.0);
        self.persist_settings();
    }

    /// Persist final statistics under `{ns}/completed`.
    pub fn mark_complete(&self) {
        #[derive(Serialize)]
        struct Completed {
            timestamp: u64,
            final_stats: hivescale_autoscale::ScalerStats,
            pool_size: usize,
        }

        self.persist(
            "completed",
            &Completed {
                timestamp: self.pool.now_ms(),
                final_stats: self.scaler.stats(),
                pool_size: self.pool.pool_size(),
            },
        );
        info!(namespace = %self.namespace, "scaling marked complete");
    }

    // ── Background loop ───────────────────────────────────────────

    /// Run `scale_down` with the configured defaults every
    /// `scale_down_interval` until `shutdown` changes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.scale_down_interval;
        info!(interval_ms = interval.as_millis() as u64, "scale-down loop started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let report = self.scale_down(ScaleDownOptions::default());
                    if !report.removed.is_empty() {
                        debug!(removed = report.removed.len(), remaining = report.remaining, "periodic scale-down");
                    }
                }
                _ = shutdown.changed() => {
                    info!("scale-down loop shutting down");
                    break;
                }
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────────

    fn key(&self, kind: &str) -> String {
        format!("{}/{}", self.namespace, kind)
    }

    /// Write `value` under `{ns}/{kind}`. Failures are logged, never returned.
    fn persist<T: Serialize>(&self, kind: &str, value: &T) {
        let key = self.key(kind);
        if let Err(e) = put_json(self.store.as_ref(), &key, value) {
            warn!(
                %key,
                backend = self.store.backend(),
                error = %e,
                "coordination store write failed, continuing"
            );
        }
    }

    fn persist_status(&self, event: StatusEvent) {
        self.persist(
            "status",
            &StatusRecord {
                event,
                last_updated: self.pool.now_ms(),
            },
        );
    }

    fn persist_settings(&self) {
        #[derive(Serialize)]
        struct Settings {
            auto_scale_enabled: bool,
            underperformer_threshold: f64,
        }

        let settings = Settings {
            auto_scale_enabled: self.auto_scale_enabled(),
            underperformer_threshold: *self
                .underperformer_threshold
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        };
        self.persist("config", &settings);
    }
}
