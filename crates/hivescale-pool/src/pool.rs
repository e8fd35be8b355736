//! Agent pool — the bounded, mutex-guarded registry of agent records.
//!
//! Agents are spawned on demand up to `max_agents`, flipped between idle
//! and active as work is assigned and finished, and removed by explicit
//! request, underperformer sweeps, or rebalancing. Removal paths other
//! than [`AgentPool::remove_agent`] and [`AgentPool::clear_pool`] only
//! ever touch idle agents.
//!
//! Scalers sharing a pool each hold an [`OwnerId`]. `acquire` stamps the
//! caller's token on every agent it hands out, and an idle agent that
//! moves to another owner loses its previous owner's claim; scalers
//! reconcile their working sets against `Agent::owner`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hivescale_core::config::PoolConfig;
use hivescale_core::{AgentId, AgentStatus, AgentType, SharedClock, SystemClock};

use crate::agent::{Agent, OwnerId, SelectionCriteria, SpawnConfig, TaskOutcome};
use crate::error::{PoolError, PoolResult};
use crate::performance::{AgentMetricsSummary, PerformanceMetrics};

/// Agents handed out by one [`AgentPool::acquire`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    /// Previously idle agents, now active.
    pub reused: Vec<Agent>,
    /// Newly spawned agents, already active.
    pub spawned: Vec<Agent>,
}

impl Acquisition {
    pub fn len(&self) -> usize {
        self.reused.len() + self.spawned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.reused.iter().chain(self.spawned.iter())
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub size: usize,
    pub active: usize,
    pub idle: usize,
    pub max_agents: usize,
    /// `size / max_agents`.
    pub utilization: f64,
}

struct AgentRecord {
    agent: Agent,
    metrics: PerformanceMetrics,
}

#[derive(Default)]
struct PoolInner {
    records: HashMap<AgentId, AgentRecord>,
    next_seq: u64,
    next_owner: OwnerId,
}

pub struct AgentPool {
    max_agents: usize,
    default_performance: f64,
    clock: SharedClock,
    inner: Mutex<PoolInner>,
}

impl AgentPool {
    /// Create an empty pool with the default initial performance (0.75).
    pub fn new(max_agents: usize) -> Self {
        Self::from_config(&PoolConfig {
            max_agents,
            ..PoolConfig::default()
        })
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self {
            max_agents: config.max_agents,
            default_performance: config.default_performance.clamp(0.0, 1.0),
            clock: Arc::new(SystemClock),
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_agents(&self) -> usize {
        self.max_agents
    }

    /// Current time as seen by this pool, in epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Issue a fresh owner token for a scaler sharing this pool.
    pub fn register_owner(&self) -> OwnerId {
        let mut inner = self.lock();
        inner.next_owner += 1;
        inner.next_owner
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Register a new idle agent.
    ///
    /// Fails with [`PoolError::CapacityExceeded`] when the pool already
    /// holds `max_agents` records.
    pub fn spawn_agent(&self, config: SpawnConfig) -> PoolResult<Agent> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let agent = inner.spawn(config, self.max_agents, self.default_performance, now)?;
        info!(
            id = %agent.id,
            agent_type = %agent.agent_type,
            size = inner.records.len(),
            max = self.max_agents,
            "spawned agent"
        );
        Ok(agent)
    }

    /// Remove an agent regardless of status.
    pub fn remove_agent(&self, id: &str) -> Option<Agent> {
        let removed = self.lock().records.remove(id).map(|r| r.agent);
        if let Some(agent) = &removed {
            info!(id = %agent.id, status = ?agent.status, "removed agent");
        }
        removed
    }

    /// Remove those of `ids` that are idle and, when `owner` is given,
    /// still held by it. Returns the removed ids.
    pub fn remove_if_idle(&self, ids: &[AgentId], owner: Option<OwnerId>) -> Vec<AgentId> {
        let mut inner = self.lock();
        let mut removed = Vec::new();
        for id in ids {
            let eligible = inner.records.get(id).is_some_and(|r| {
                r.agent.is_idle() && owner.is_none_or(|o| r.agent.owner == Some(o))
            });
            if eligible {
                inner.records.remove(id);
                removed.push(id.clone());
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), size = inner.records.len(), "removed idle agents");
        }
        removed
    }

    /// Drop every record; returns how many were dropped.
    pub fn clear_pool(&self) -> usize {
        let mut inner = self.lock();
        let count = inner.records.len();
        inner.records.clear();
        info!(count, "cleared agent pool");
        count
    }

    // ── Reads ─────────────────────────────────────────────────────

    pub fn get_agent(&self, id: &str) -> Option<Agent> {
        self.lock().records.get(id).map(|r| r.agent.clone())
    }

    /// Every agent, in spawn order.
    pub fn all_agents(&self) -> Vec<Agent> {
        self.lock().sorted().into_iter().cloned().collect()
    }

    pub fn active_agents(&self) -> Vec<Agent> {
        self.agents_with_status(AgentStatus::Active)
    }

    pub fn idle_agents(&self) -> Vec<Agent> {
        self.agents_with_status(AgentStatus::Idle)
    }

    fn agents_with_status(&self, status: AgentStatus) -> Vec<Agent> {
        self.lock()
            .sorted()
            .into_iter()
            .filter(|a| a.status == status)
            .cloned()
            .collect()
    }

    pub fn pool_size(&self) -> usize {
        self.lock().records.len()
    }

    pub fn active_count(&self) -> usize {
        self.lock().count_status(AgentStatus::Active)
    }

    pub fn idle_count(&self) -> usize {
        self.lock().count_status(AgentStatus::Idle)
    }

    /// Number of agents per type; types with no agents are omitted.
    pub fn type_distribution(&self) -> BTreeMap<AgentType, usize> {
        self.lock().type_distribution()
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.lock();
        let size = inner.records.len();
        let active = inner.count_status(AgentStatus::Active);
        PoolStats {
            size,
            active,
            idle: size - active,
            max_agents: self.max_agents,
            utilization: if self.max_agents == 0 {
                0.0
            } else {
                size as f64 / self.max_agents as f64
            },
        }
    }

    // ── Status transitions ────────────────────────────────────────

    /// Mark an agent active on `task_id`. Returns false for unknown ids.
    pub fn mark_active(&self, id: &str, task_id: Option<&str>) -> bool {
        let now = self.clock.now_ms();
        let activated = self.lock().activate(id, task_id, now).is_some();
        if activated {
            debug!(%id, task = task_id.unwrap_or("-"), "agent active");
        }
        activated
    }

    /// Return an agent to idle and clear its current task.
    pub fn mark_idle(&self, id: &str) -> bool {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let Some(record) = inner.records.get_mut(id) else {
            return false;
        };
        record.agent.status = AgentStatus::Idle;
        record.agent.current_task = None;
        record.agent.last_active = now;
        debug!(%id, "agent idle");
        true
    }

    /// Hand out `count` agents for `task_id` to `owner`: idle agents
    /// first, then freshly spawned agents of `agent_type` up to capacity.
    /// May return fewer than `count`.
    ///
    /// Unowned idle agents go before idle agents parked by another owner,
    /// each group longest idle first. Every returned agent carries `owner`.
    ///
    /// The idle check, the spawn, and the activation happen under one
    /// lock, so two concurrent callers never receive the same agent.
    pub fn acquire(
        &self,
        count: usize,
        agent_type: AgentType,
        task_id: Option<&str>,
        owner: Option<OwnerId>,
    ) -> Acquisition {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let mut acquisition = Acquisition::default();

        let idle = inner.reusable_idle();
        for id in idle.into_iter().take(count) {
            if let Some(agent) = inner.claim(&id, task_id, owner, now) {
                acquisition.reused.push(agent);
            }
        }

        while acquisition.len() < count {
            let spawned = inner.spawn(
                SpawnConfig::of_type(agent_type),
                self.max_agents,
                self.default_performance,
                now,
            );
            match spawned {
                Ok(agent) => {
                    if let Some(active) = inner.claim(&agent.id, task_id, owner, now) {
                        acquisition.spawned.push(active);
                    }
                }
                Err(err) => {
                    debug!(%err, wanted = count, got = acquisition.len(), "acquire stopped short");
                    break;
                }
            }
        }

        if !acquisition.is_empty() {
            info!(
                task = task_id.unwrap_or("-"),
                reused = acquisition.reused.len(),
                spawned = acquisition.spawned.len(),
                size = inner.records.len(),
                "acquired agents"
            );
        }
        acquisition
    }

    /// Activate up to `limit` of `ids` that are idle and still held by
    /// `owner`, longest idle first.
    pub fn activate_idle(
        &self,
        owner: OwnerId,
        ids: &[AgentId],
        limit: usize,
        task_id: Option<&str>,
    ) -> Vec<Agent> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let candidates = inner.owned_idle(owner, ids);
        candidates
            .into_iter()
            .take(limit)
            .filter_map(|id| inner.activate(&id, task_id, now))
            .collect()
    }

    /// Drop `owner`'s claim on `ids`. Agents held by another owner are
    /// left alone. Returns how many claims were dropped.
    pub fn release(&self, owner: OwnerId, ids: &[AgentId]) -> usize {
        let mut inner = self.lock();
        let mut released = 0;
        for id in ids {
            if let Some(record) = inner.records.get_mut(id) {
                if record.agent.owner == Some(owner) {
                    record.agent.owner = None;
                    released += 1;
                }
            }
        }
        if released > 0 {
            debug!(owner, released, "released agents");
        }
        released
    }

    // ── Selection & performance ───────────────────────────────────

    /// Rank agents for assignment.
    ///
    /// Filters by type and minimum performance; when `prefer_idle` is set
    /// and any idle agent survives the filter, only idle agents are kept.
    /// Sorted by descending performance, ties in spawn order.
    pub fn select_agents(&self, criteria: &SelectionCriteria) -> Vec<Agent> {
        let inner = self.lock();
        let mut candidates: Vec<&Agent> = inner
            .sorted()
            .into_iter()
            .filter(|a| criteria.matches(a))
            .collect();

        if criteria.prefer_idle && candidates.iter().any(|a| a.is_idle()) {
            candidates.retain(|a| a.is_idle());
        }

        // stable: equal performance keeps spawn order
        candidates.sort_by(|a, b| b.performance.total_cmp(&a.performance));

        let limit = criteria.count.unwrap_or(candidates.len());
        candidates.into_iter().take(limit).cloned().collect()
    }

    /// Fold a finished task into the agent's history and recompute its
    /// performance. Returns the new performance, or `None` for unknown ids.
    pub fn record_task_completion(&self, id: &str, outcome: TaskOutcome) -> Option<f64> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let record = inner.records.get_mut(id)?;

        record.metrics.record(outcome);
        record.agent.tasks_completed += 1;
        record.agent.last_active = now;
        if let Some(performance) = record.metrics.performance() {
            record.agent.performance = performance;
        }

        debug!(
            %id,
            success = outcome.success,
            duration_ms = ?outcome.duration_ms,
            performance = record.agent.performance,
            "recorded task completion"
        );
        Some(record.agent.performance)
    }

    pub fn agent_metrics(&self, id: &str) -> Option<AgentMetricsSummary> {
        let inner = self.lock();
        let record = inner.records.get(id)?;
        let m = &record.metrics;
        Some(AgentMetricsSummary {
            tasks_completed: record.agent.tasks_completed,
            successful_tasks: m.successful_tasks,
            failed_tasks: m.failed_tasks,
            success_rate: m.success_rate(),
            average_duration_ms: m.average_duration_ms(),
            recent_durations_ms: m.recent_durations().collect(),
            performance: record.agent.performance,
        })
    }

    // ── Maintenance ───────────────────────────────────────────────

    /// Remove idle agents whose performance is below `threshold`.
    /// Active agents are never touched.
    pub fn remove_underperformers(&self, threshold: f64) -> Vec<AgentId> {
        let mut inner = self.lock();
        let doomed: Vec<AgentId> = inner
            .sorted()
            .into_iter()
            .filter(|a| a.is_idle() && a.performance < threshold)
            .map(|a| a.id.clone())
            .collect();

        for id in &doomed {
            inner.records.remove(id);
        }
        if !doomed.is_empty() {
            info!(threshold, removed = doomed.len(), "removed underperforming agents");
        }
        doomed
    }

    /// Move the type mix toward `desired`.
    ///
    /// Phase one evicts idle agents of over-represented types, worst
    /// performers first; phase two spawns agents of under-represented
    /// types until capacity runs out. Types absent from `desired` are left
    /// alone. Returns the resulting distribution.
    pub fn rebalance_pool(&self, desired: &BTreeMap<AgentType, usize>) -> BTreeMap<AgentType, usize> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let mut evicted = 0usize;
        let mut spawned = 0usize;

        for (&agent_type, &target) in desired {
            let current = inner.count_type(agent_type);
            if current <= target {
                continue;
            }
            let mut idle: Vec<&Agent> = inner
                .records
                .values()
                .map(|r| &r.agent)
                .filter(|a| a.agent_type == agent_type && a.is_idle())
                .collect();
            idle.sort_by(|a, b| {
                a.performance
                    .total_cmp(&b.performance)
                    .then(a.spawn_seq.cmp(&b.spawn_seq))
            });
            let victims: Vec<AgentId> = idle
                .into_iter()
                .take(current - target)
                .map(|a| a.id.clone())
                .collect();
            for id in victims {
                debug!(%id, %agent_type, "evicting for rebalance");
                inner.records.remove(&id);
                evicted += 1;
            }
        }

        'types: for (&agent_type, &target) in desired {
            let current = inner.count_type(agent_type);
            for _ in current..target {
                let result = inner.spawn(
                    SpawnConfig::of_type(agent_type),
                    self.max_agents,
                    self.default_performance,
                    now,
                );
                if result.is_err() {
                    break 'types;
                }
                spawned += 1;
            }
        }

        let distribution = inner.type_distribution();
        info!(evicted, spawned, size = inner.records.len(), "rebalanced agent pool");
        distribution
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PoolInner {
    fn spawn(
        &mut self,
        config: SpawnConfig,
        max_agents: usize,
        default_performance: f64,
        now: u64,
    ) -> PoolResult<Agent> {
        if self.records.len() >= max_agents {
            return Err(PoolError::CapacityExceeded { max: max_agents });
        }
        if let Some(id) = &config.id {
            if self.records.contains_key(id) {
                return Err(PoolError::DuplicateAgent(id.clone()));
            }
        }

        let agent_type = config.agent_type.unwrap_or(AgentType::Coder);
        self.next_seq += 1;
        let seq = self.next_seq;
        let id = match config.id {
            Some(id) => id,
            None => self.fresh_id(agent_type, seq),
        };
        let performance = config
            .performance
            .filter(|p| p.is_finite())
            .map_or(default_performance, |p| p.clamp(0.0, 1.0));

        let agent = Agent {
            id: id.clone(),
            agent_type,
            status: AgentStatus::Idle,
            performance,
            spawned_at: now,
            last_active: now,
            tasks_completed: 0,
            current_task: None,
            spawn_seq: seq,
            owner: None,
        };
        self.records.insert(
            id,
            AgentRecord {
                agent: agent.clone(),
                metrics: PerformanceMetrics::default(),
            },
        );
        Ok(agent)
    }

    /// `{type}-{seq}`, skipping ids already taken by explicit spawns.
    fn fresh_id(&self, agent_type: AgentType, seq: u64) -> AgentId {
        let mut n = seq;
        loop {
            let candidate = format!("{agent_type}-{n}");
            if !self.records.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Activate `id` for `task_id` and hand it to `owner`.
    fn claim(
        &mut self,
        id: &str,
        task_id: Option<&str>,
        owner: Option<OwnerId>,
        now: u64,
    ) -> Option<Agent> {
        let record = self.records.get_mut(id)?;
        if record.agent.owner.is_some() && record.agent.owner != owner {
            debug!(%id, from = ?record.agent.owner, to = ?owner, "idle agent changes owner");
        }
        record.agent.owner = owner;
        self.activate(id, task_id, now)
    }

    fn activate(&mut self, id: &str, task_id: Option<&str>, now: u64) -> Option<Agent> {
        let record = self.records.get_mut(id)?;
        record.agent.status = AgentStatus::Active;
        record.agent.current_task = task_id.map(str::to_string);
        record.agent.last_active = now;
        Some(record.agent.clone())
    }

    fn sorted(&self) -> Vec<&Agent> {
        let mut agents: Vec<&Agent> = self.records.values().map(|r| &r.agent).collect();
        agents.sort_by_key(|a| a.spawn_seq);
        agents
    }

    /// Idle agent ids for reuse: unowned before owned, then by
    /// `last_active` and spawn order.
    fn reusable_idle(&self) -> Vec<AgentId> {
        let mut idle: Vec<&Agent> = self
            .records
            .values()
            .map(|r| &r.agent)
            .filter(|a| a.is_idle())
            .collect();
        idle.sort_by_key(|a| (a.owner.is_some(), a.last_active, a.spawn_seq));
        idle.into_iter().map(|a| a.id.clone()).collect()
    }

    /// Idle agents among `within` held by `owner`, longest idle first.
    fn owned_idle(&self, owner: OwnerId, within: &[AgentId]) -> Vec<AgentId> {
        let mut idle: Vec<&Agent> = within
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|r| &r.agent)
            .filter(|a| a.is_idle() && a.owner == Some(owner))
            .collect();
        idle.sort_by_key(|a| (a.last_active, a.spawn_seq));
        idle.into_iter().map(|a| a.id.clone()).collect()
    }

    fn count_status(&self, status: AgentStatus) -> usize {
        self.records.values().filter(|r| r.agent.status == status).count()
    }

    fn count_type(&self, agent_type: AgentType) -> usize {
        self.records
            .values()
            .filter(|r| r.agent.agent_type == agent_type)
            .count()
    }

    fn type_distribution(&self) -> BTreeMap<AgentType, usize> {
        let mut distribution = BTreeMap::new();
        for record in self.records.values() {
            *distribution.entry(record.agent.agent_type).or_insert(0) += 1;
        }
        distribution
    }
}
