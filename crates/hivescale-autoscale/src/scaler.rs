//! AutoScaler — reconciles a private working set of agents against the
//! shared pool.
//!
//! The scaler remembers which agents it has allocated ("tracked"). The
//! pool may serve other scalers too, so each scaler holds its own owner
//! token and the tracked view is reconciled against the pool on every
//! operation: ids that left the pool or now belong to another scaler
//! are forgotten.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hivescale_complexity::ComplexityDetector;
use hivescale_core::config::ScalerConfig;
use hivescale_core::{AgentId, CapacityCurve, Task, TaskId};
use hivescale_pool::{Agent, AgentHandle, AgentPool, OwnerId};

use crate::inference::infer_agent_type;

/// Overrides for one [`AutoScaler::scale_down`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDownOptions {
    /// Upper bound on removals; the configured per-cycle limit when absent.
    pub max_remove: Option<usize>,
    /// Minimum idle time before an agent is eligible; the configured
    /// timeout when absent.
    pub idle_timeout_ms: Option<u64>,
}

/// Outcome of [`AutoScaler::scale_for_task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub task_id: TaskId,
    pub score: u32,
    /// Target size of the working set for this score.
    pub required: usize,
    /// Active tracked agents after reconciliation.
    pub agents: Vec<Agent>,
    /// Agents newly brought in from the pool's idle set.
    pub reused: usize,
    /// Agents newly spawned.
    pub spawned: usize,
    /// Tracked agents let go because the working set shrank.
    pub released: Vec<AgentId>,
}

impl Allocation {
    /// True when the pool could not supply `required` agents.
    pub fn is_partial(&self) -> bool {
        self.agents.len() < self.required
    }

    pub fn handles(&self) -> Vec<AgentHandle> {
        self.agents.iter().map(Agent::handle).collect()
    }
}

/// Cumulative scaling event counters. Never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingEvents {
    pub scale_ups: u64,
    pub scale_downs: u64,
    pub agents_spawned: u64,
    pub agents_reused: u64,
    pub agents_released: u64,
    pub agents_removed: u64,
}

/// Point-in-time scaler statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    /// Agents tracked by this scaler, active or idle.
    pub active_agents: usize,
    /// Tracked agents currently idle.
    pub idle_agents: usize,
    /// Tracked agents idle past the configured timeout.
    pub reclaimable_agents: usize,
    /// Agents in the whole pool.
    pub total_agents: usize,
    pub max_agents: usize,
    pub min_agents: usize,
    /// Epoch milliseconds of the last change to the working set.
    pub last_scale_time: u64,
    /// Pool size over `max_agents`.
    pub pool_utilization: f64,
    pub events: ScalingEvents,
}

struct ScalerState {
    tracked: Vec<AgentId>,
    last_scale_time: u64,
    events: ScalingEvents,
}

impl ScalerState {
    /// Forget tracked ids that left the pool or are no longer held by
    /// `owner`.
    fn reconcile(&mut self, pool: &AgentPool, owner: OwnerId) -> Vec<Agent> {
        let mut live = Vec::with_capacity(self.tracked.len());
        self.tracked.retain(|id| match pool.get_agent(id) {
            Some(agent) if agent.owner == Some(owner) => {
                live.push(agent);
                true
            }
            Some(agent) => {
                debug!(%id, owner = ?agent.owner, "tracked agent taken over");
                false
            }
            None => {
                debug!(%id, "tracked agent left the pool");
                false
            }
        });
        live
    }

    fn untrack(&mut self, id: &str) {
        self.tracked.retain(|t| t != id);
    }
}

pub struct AutoScaler {
    pool: Arc<AgentPool>,
    detector: ComplexityDetector,
    min_agents: usize,
    max_agents: usize,
    curve: CapacityCurve,
    max_remove_per_cycle: usize,
    idle_timeout: Duration,
    owner: OwnerId,
    state: Mutex<ScalerState>,
}

impl AutoScaler {
    /// Scaler with the default bounds (1..=12) and scale-down settings.
    pub fn new(pool: Arc<AgentPool>, detector: ComplexityDetector) -> Self {
        Self::from_config(pool, detector, &ScalerConfig::default())
    }

    pub fn from_config(
        pool: Arc<AgentPool>,
        detector: ComplexityDetector,
        config: &ScalerConfig,
    ) -> Self {
        let now = pool.now_ms();
        let owner = pool.register_owner();
        Self {
            pool,
            detector,
            min_agents: config.min_agents,
            max_agents: config.max_agents.max(config.min_agents),
            curve: config.thresholds,
            max_remove_per_cycle: config.scale_down.max_remove_per_cycle,
            idle_timeout: config.scale_down.idle_timeout(),
            owner,
            state: Mutex::new(ScalerState {
                tracked: Vec::new(),
                last_scale_time: now,
                events: ScalingEvents::default(),
            }),
        }
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    pub fn detector(&self) -> &ComplexityDetector {
        &self.detector
    }

    pub fn min_agents(&self) -> usize {
        self.min_agents
    }

    pub fn max_agents(&self) -> usize {
        self.max_agents
    }

    /// Token this scaler's agents carry in the pool.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Working-set size for `score`, clamped to `[min_agents, max_agents]`.
    pub fn required_agents(&self, score: u32) -> usize {
        self.curve.required_agents(score, self.min_agents, self.max_agents)
    }

    /// Score `task` (unless it carries a score) and reconcile capacity.
    ///
    /// Never fails. When the pool is full the returned allocation holds
    /// fewer agents than `required`; see [`Allocation::is_partial`].
    pub fn scale_for_task(&self, task: &Task) -> Allocation {
        let score = task
            .precomputed_score()
            .unwrap_or_else(|| self.detector.score_task(task));
        self.scale_with_score(task, score)
    }

    /// Reconcile capacity for `task` using an already computed `score`.
    pub fn scale_with_score(&self, task: &Task, score: u32) -> Allocation {
        let score = score.min(100);
        let required = self.required_agents(score);
        let task_id = (!task.id.is_empty()).then_some(task.id.as_str());
        let now = self.pool.now_ms();

        let mut state = self.lock();
        let tracked = state.reconcile(&self.pool, self.owner);
        let before = tracked.len();

        // Shrink: let go of long-idle tracked agents, worst first.
        let mut released = Vec::new();
        if required < tracked.len() {
            let floor = required.max(self.min_agents);
            let excess = tracked.len().saturating_sub(floor);
            let mut stale: Vec<&Agent> = tracked
                .iter()
                .filter(|a| a.is_idle() && self.is_past_timeout(a, now))
                .collect();
            stale.sort_by(|a, b| a.performance.total_cmp(&b.performance));
            for agent in stale.into_iter().take(excess) {
                state.untrack(&agent.id);
                released.push(agent.id.clone());
            }
            self.pool.release(self.owner, &released);
        }

        // Grow: own idle agents first, then the pool.
        let active_tracked = tracked
            .iter()
            .filter(|a| a.is_active() && !released.contains(&a.id))
            .count();
        let wanted = required.saturating_sub(active_tracked);
        let reengaged = if wanted > 0 {
            self.pool.activate_idle(self.owner, &state.tracked, wanted, task_id)
        } else {
            Vec::new()
        };

        let headroom = self.max_agents.saturating_sub(state.tracked.len());
        let shortfall = wanted.saturating_sub(reengaged.len()).min(headroom);
        let mut reused = 0;
        let mut spawned = 0;
        if shortfall > 0 {
            let agent_type = infer_agent_type(&task.description);
            let acquisition = self.pool
                .acquire(shortfall, agent_type, task_id, Some(self.owner));
            reused = acquisition.reused.len();
            spawned = acquisition.spawned.len();
            state
                .tracked
                .extend(acquisition.agents().map(|a| a.id.clone()));
        }

        let grew = !reengaged.is_empty() || reused + spawned > 0;
        if grew {
            state.events.scale_ups += 1;
            state.events.agents_reused += reused as u64;
            state.events.agents_spawned += spawned as u64;
        }
        if !released.is_empty() {
            state.events.scale_downs += 1;
            state.events.agents_released += released.len() as u64;
        }
        if grew || !released.is_empty() {
            state.last_scale_time = now;
        }

        let agents: Vec<Agent> = state
            .tracked
            .iter()
            .filter_map(|id| self.pool.get_agent(id))
            .filter(|a| a.is_active() && a.owner == Some(self.owner))
            .collect();

        info!(
            task = task_id.unwrap_or("-"),
            score,
            required,
            from = before,
            to = state.tracked.len(),
            reengaged = reengaged.len(),
            reused,
            spawned,
            released = released.len(),
            allocated = agents.len(),
            "scaled for task"
        );

        Allocation {
            task_id: task.id.clone(),
            score,
            required,
            agents,
            reused,
            spawned,
            released,
        }
    }

    /// Delete tracked agents that have been idle past the timeout.
    ///
    /// Removes the lowest performers first, at most `max_remove`, and
    /// never shrinks the tracked set below `min_agents`. Returns the
    /// removed ids.
    pub fn scale_down(&self, options: ScaleDownOptions) -> Vec<AgentId> {
        let max_remove = options.max_remove.unwrap_or(self.max_remove_per_cycle);
        let timeout_ms = options
            .idle_timeout_ms
            .unwrap_or(self.idle_timeout.as_millis() as u64);
        let now = self.pool.now_ms();

        let mut state = self.lock();
        let tracked = state.reconcile(&self.pool, self.owner);

        let mut candidates: Vec<&Agent> = tracked
            .iter()
            .filter(|a| a.is_idle() && a.idle_for_ms(now) > timeout_ms)
            .collect();
        let room = tracked.len().saturating_sub(self.min_agents);
        let count = max_remove.min(candidates.len()).min(room);
        if count == 0 {
            debug!(
                candidates = candidates.len(),
                tracked = tracked.len(),
                min = self.min_agents,
                "scale-down: nothing to remove"
            );
            return Vec::new();
        }

        candidates.sort_by(|a, b| a.performance.total_cmp(&b.performance));
        let victims: Vec<AgentId> = candidates
            .into_iter()
            .take(count)
            .map(|a| a.id.clone())
            .collect();

        // an agent re-activated or taken over since the snapshot is skipped
        let removed = self.pool.remove_if_idle(&victims, Some(self.owner));
        for id in &removed {
            state.untrack(id);
        }

        if !removed.is_empty() {
            state.events.scale_downs += 1;
            state.events.agents_removed += removed.len() as u64;
            state.last_scale_time = now;
            info!(
                from = tracked.len(),
                to = state.tracked.len(),
                removed = removed.len(),
                idle_timeout_ms = timeout_ms,
                "scaled down"
            );
        }
        removed
    }

    /// Tracked agents, in allocation order.
    pub fn tracked_agents(&self) -> Vec<Agent> {
        let mut state = self.lock();
        state.reconcile(&self.pool, self.owner)
    }

    /// Tracked agents that are currently active.
    pub fn active_agents(&self) -> Vec<Agent> {
        self.tracked_agents()
            .into_iter()
            .filter(Agent::is_active)
            .collect()
    }

    /// Number of agents tracked by this scaler.
    pub fn active_agent_count(&self) -> usize {
        self.tracked_agents().len()
    }

    pub fn stats(&self) -> ScalerStats {
        let now = self.pool.now_ms();
        let mut state = self.lock();
        let tracked = state.reconcile(&self.pool, self.owner);
        let total_agents = self.pool.pool_size();

        ScalerStats {
            active_agents: tracked.len(),
            idle_agents: tracked.iter().filter(|a| a.is_idle()).count(),
            reclaimable_agents: tracked
                .iter()
                .filter(|a| a.is_idle() && self.is_past_timeout(a, now))
                .count(),
            total_agents,
            max_agents: self.max_agents,
            min_agents: self.min_agents,
            last_scale_time: state.last_scale_time,
            pool_utilization: if self.max_agents == 0 {
                0.0
            } else {
                total_agents as f64 / self.max_agents as f64
            },
            events: state.events,
        }
    }

    /// Forget the tracked set and give up ownership of it. Agents stay in
    /// the pool; event counters are kept.
    pub fn reset(&self) {
        let now = self.pool.now_ms();
        let mut state = self.lock();
        let forgotten = state.tracked.len();
        self.pool.release(self.owner, &state.tracked);
        state.tracked.clear();
        state.last_scale_time = now;
        info!(forgotten, "scaler reset");
    }

    fn is_past_timeout(&self, agent: &Agent, now: u64) -> bool {
        u128::from(agent.idle_for_ms(now)) > self.idle_timeout.as_millis()
    }

    fn lock(&self) -> MutexGuard<'_, ScalerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hivescale_core::config::ScaleDownConfig;
    use hivescale_core::{AgentType, ManualClock};
    use hivescale_pool::{SpawnConfig, TaskOutcome};

    use super::*;

    fn test_scaler(pool_max: usize) -> (AutoScaler, Arc<AgentPool>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000_000));
        let pool = Arc::new(AgentPool::new(pool_max).with_clock(clock.clone()));
        let scaler = AutoScaler::new(pool.clone(), ComplexityDetector::new());
        (scaler, pool, clock)
    }

    fn idle_all(scaler: &AutoScaler) {
        for agent in scaler.tracked_agents() {
            scaler.pool().mark_idle(&agent.id);
        }
    }

    #[test]
    fn low_score_allocates_three() {
        let (scaler, pool, _) = test_scaler(12);
        let allocation = scaler.scale_for_task(&Task::with_score("t1", 25));
        assert_eq!(allocation.required, 3);
        assert_eq!(allocation.agents.len(), 3);
        assert_eq!(allocation.spawned, 3);
        assert!(!allocation.is_partial());
        assert!(allocation.agents.iter().all(|a| a.agent_type == AgentType::Coder));
        assert!(
            allocation
                .agents
                .iter()
                .all(|a| a.current_task.as_deref() == Some("t1"))
        );
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn scores_without_precomputed_value_go_through_detector() {
        let (scaler, _, _) = test_scaler(12);
        let task = Task::new("t1", "fix typo");
        let allocation = scaler.scale_for_task(&task);
        assert_eq!(allocation.score, scaler.detector().score_task(&task));
        assert_eq!(allocation.agents.len(), 3);
    }

    #[test]
    fn spawned_type_follows_description() {
        let (scaler, _, _) = test_scaler(12);
        let mut task = Task::new("t1", "write regression test suite");
        task.complexity_score = Some(10);
        let allocation = scaler.scale_for_task(&task);
        assert!(allocation.agents.iter().all(|a| a.agent_type == AgentType::Tester));
    }

    #[test]
    fn required_is_non_decreasing() {
        let (scaler, _, _) = test_scaler(12);
        let mut prev = 0;
        for score in 0..=100 {
            let r = scaler.required_agents(score);
            assert!(r >= prev);
            assert!((1..=12).contains(&r));
            prev = r;
        }
    }

    #[test]
    fn reuses_pool_idle_before_spawning() {
        let (scaler, pool, _) = test_scaler(12);
        pool.spawn_agent(SpawnConfig::of_type(AgentType::Reviewer)).unwrap();
        pool.spawn_agent(SpawnConfig::of_type(AgentType::Reviewer)).unwrap();

        let allocation = scaler.scale_for_task(&Task::with_score("t1", 25));
        assert_eq!(allocation.reused, 2);
        assert_eq!(allocation.spawned, 1);
        assert_eq!(pool.pool_size(), 3);
    }

    #[test]
    fn growing_task_adds_only_the_delta() {
        let (scaler, pool, _) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 25));
        let allocation = scaler.scale_for_task(&Task::with_score("t2", 80));
        assert_eq!(allocation.required, 8);
        assert_eq!(allocation.spawned, 5);
        assert_eq!(allocation.agents.len(), 8);
        assert_eq!(pool.pool_size(), 8);
        assert_eq!(scaler.stats().events.scale_ups, 2);
    }

    #[test]
    fn own_idle_agents_are_reengaged() {
        let (scaler, pool, _) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 25));
        idle_all(&scaler);

        let allocation = scaler.scale_for_task(&Task::with_score("t2", 25));
        assert_eq!(allocation.agents.len(), 3);
        assert_eq!(allocation.spawned, 0);
        assert_eq!(allocation.reused, 0);
        assert_eq!(pool.pool_size(), 3);
        assert!(
            allocation
                .agents
                .iter()
                .all(|a| a.current_task.as_deref() == Some("t2"))
        );
    }

    #[test]
    fn partial_allocation_when_pool_is_full() {
        let (scaler, pool, _) = test_scaler(5);
        let allocation = scaler.scale_for_task(&Task::with_score("t1", 95));
        assert!(allocation.required > 5);
        assert_eq!(allocation.agents.len(), 5);
        assert!(allocation.is_partial());
        assert_eq!(pool.pool_size(), 5);
    }

    #[test]
    fn shrinking_task_releases_only_long_idle_agents() {
        let (scaler, pool, clock) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 80));
        let tracked = scaler.tracked_agents();
        // two finish early and go stale, the rest stay busy
        pool.mark_idle(&tracked[0].id);
        pool.mark_idle(&tracked[1].id);
        clock.advance(Duration::from_secs(60));

        let allocation = scaler.scale_for_task(&Task::with_score("t2", 10));
        assert_eq!(allocation.released.len(), 2);
        // six still busy: active work is never interrupted
        assert_eq!(allocation.agents.len(), 6);
        assert_eq!(scaler.active_agent_count(), 6);
        // released agents stay in the pool
        assert_eq!(pool.pool_size(), 8);
    }

    #[test]
    fn release_respects_min_agents() {
        let clock = Arc::new(ManualClock::new(0));
        let pool = Arc::new(AgentPool::new(12).with_clock(clock.clone()));
        let config = ScalerConfig {
            min_agents: 3,
            ..ScalerConfig::default()
        };
        let scaler = AutoScaler::from_config(pool.clone(), ComplexityDetector::new(), &config);

        scaler.scale_for_task(&Task::with_score("t1", 60));
        assert_eq!(scaler.active_agent_count(), 5);
        idle_all(&scaler);
        clock.advance(Duration::from_secs(120));

        let mut tiny = Task::with_score("t2", 0);
        tiny.id = String::new();
        let allocation = scaler.scale_for_task(&tiny);
        assert_eq!(allocation.required, 3);
        assert_eq!(allocation.released.len(), 2);
        assert_eq!(scaler.active_agent_count(), 3);
    }

    #[test]
    fn scale_down_removes_worst_idle_agents() {
        let (scaler, pool, clock) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 80));
        let tracked = scaler.tracked_agents();
        assert_eq!(tracked.len(), 8);

        let outcomes = [
            TaskOutcome::succeeded(500),
            TaskOutcome::failed(9_000),
            TaskOutcome::failed(20_000),
        ];
        for (agent, outcome) in tracked.iter().zip(outcomes) {
            pool.record_task_completion(&agent.id, outcome);
            pool.mark_idle(&agent.id);
        }
        clock.advance(Duration::from_secs(60));

        let removed = scaler.scale_down(ScaleDownOptions {
            max_remove: Some(2),
            idle_timeout_ms: Some(30_000),
        });
        assert_eq!(removed, vec![tracked[2].id.clone(), tracked[1].id.clone()]);
        assert_eq!(scaler.active_agent_count(), 6);
        assert_eq!(pool.pool_size(), 6);
        assert!(pool.get_agent(&tracked[0].id).is_some());

        let stats = scaler.stats();
        assert_eq!(stats.events.scale_downs, 1);
        assert_eq!(stats.events.agents_removed, 2);
    }

    #[test]
    fn scale_down_ignores_recently_idle_agents() {
        let (scaler, _, clock) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 25));
        idle_all(&scaler);
        clock.advance(Duration::from_secs(10));

        let removed = scaler.scale_down(ScaleDownOptions {
            max_remove: Some(5),
            idle_timeout_ms: Some(30_000),
        });
        assert!(removed.is_empty());
        assert_eq!(scaler.active_agent_count(), 3);
    }

    #[test]
    fn scale_down_respects_min_agents() {
        let clock = Arc::new(ManualClock::new(0));
        let pool = Arc::new(AgentPool::new(12).with_clock(clock.clone()));
        let config = ScalerConfig {
            min_agents: 2,
            scale_down: ScaleDownConfig {
                idle_timeout: "1s".to_string(),
                max_remove_per_cycle: 10,
            },
            ..ScalerConfig::default()
        };
        let scaler = AutoScaler::from_config(pool.clone(), ComplexityDetector::new(), &config);
        scaler.scale_for_task(&Task::with_score("t1", 25));
        idle_all(&scaler);
        clock.advance(Duration::from_secs(5));

        let removed = scaler.scale_down(ScaleDownOptions::default());
        assert_eq!(removed.len(), 1);
        assert_eq!(scaler.active_agent_count(), 2);
        assert!(scaler.scale_down(ScaleDownOptions::default()).is_empty());
    }

    #[test]
    fn agents_removed_elsewhere_drop_out_of_tracking() {
        let (scaler, pool, _) = test_scaler(12);
        let allocation = scaler.scale_for_task(&Task::with_score("t1", 25));
        pool.remove_agent(&allocation.agents[0].id);
        assert_eq!(scaler.active_agent_count(), 2);
        assert_eq!(scaler.stats().total_agents, 2);
    }

    #[test]
    fn stats_report_pool_and_tracked_view() {
        let (scaler, pool, clock) = test_scaler(12);
        pool.spawn_agent(SpawnConfig::default()).unwrap();
        scaler.scale_for_task(&Task::with_score("t1", 25));
        let first = scaler.tracked_agents()[0].id.clone();
        pool.mark_idle(&first);
        clock.advance(Duration::from_secs(45));

        let stats = scaler.stats();
        assert_eq!(stats.active_agents, 3);
        assert_eq!(stats.idle_agents, 1);
        assert_eq!(stats.reclaimable_agents, 1);
        assert_eq!(stats.total_agents, 3);
        assert_eq!(stats.min_agents, 1);
        assert_eq!(stats.max_agents, 12);
        assert!((stats.pool_utilization - 0.25).abs() < 1e-9);
        assert_eq!(stats.events.agents_reused, 1);
        assert_eq!(stats.events.agents_spawned, 2);
    }

    #[test]
    fn reset_forgets_tracking_but_keeps_pool() {
        let (scaler, pool, _) = test_scaler(12);
        scaler.scale_for_task(&Task::with_score("t1", 25));
        scaler.reset();
        assert_eq!(scaler.active_agent_count(), 0);
        assert_eq!(pool.pool_size(), 3);
        assert!(pool.all_agents().iter().all(|a| a.owner.is_none()));
        assert_eq!(scaler.stats().events.scale_ups, 1);
    }

    // ── Shared pool ───────────────────────────────────────────────────

    fn second_scaler(pool: &Arc<AgentPool>) -> AutoScaler {
        AutoScaler::new(pool.clone(), ComplexityDetector::new())
    }

    #[test]
    fn shared_pool_never_hands_one_agent_to_two_tasks() {
        let (a, pool, _) = test_scaler(12);
        let b = second_scaler(&pool);
        assert_ne!(a.owner(), b.owner());

        a.scale_for_task(&Task::with_score("t1", 25));
        idle_all(&a);
        let taken = b.scale_for_task(&Task::with_score("t2", 25));
        assert_eq!(taken.reused, 3);
        assert_eq!(a.active_agent_count(), 0);

        let allocation = a.scale_for_task(&Task::with_score("t3", 25));
        assert_eq!(allocation.agents.len(), 3);
        assert_eq!(allocation.spawned, 3);
        assert!(
            allocation
                .agents
                .iter()
                .all(|x| x.current_task.as_deref() == Some("t3"))
        );
        assert!(
            b.tracked_agents()
                .iter()
                .all(|x| x.current_task.as_deref() == Some("t2"))
        );
        assert_eq!(pool.pool_size(), 6);
    }

    #[test]
    fn scale_down_never_removes_another_scalers_agents() {
        let (a, pool, clock) = test_scaler(12);
        let b = second_scaler(&pool);

        a.scale_for_task(&Task::with_score("t1", 25));
        idle_all(&a);
        b.scale_for_task(&Task::with_score("t2", 25));
        idle_all(&b);
        clock.advance(Duration::from_secs(120));

        let removed = a.scale_down(ScaleDownOptions {
            max_remove: Some(5),
            idle_timeout_ms: Some(30_000),
        });
        assert!(removed.is_empty());
        assert_eq!(pool.pool_size(), 3);
        assert_eq!(b.active_agent_count(), 3);
    }

    #[test]
    fn released_agents_are_free_for_other_scalers() {
        let (a, pool, clock) = test_scaler(12);
        let b = second_scaler(&pool);

        a.scale_for_task(&Task::with_score("t1", 60));
        idle_all(&a);
        clock.advance(Duration::from_secs(60));
        let shrunk = a.scale_for_task(&Task::with_score("t2", 10));
        assert_eq!(shrunk.released.len(), 2);
        for id in &shrunk.released {
            assert_eq!(pool.get_agent(id).unwrap().owner, None);
        }

        // the two released agents are reused, the three a kept are not
        let allocation = b.scale_for_task(&Task::with_score("t3", 60));
        assert_eq!(allocation.reused, 2);
        assert_eq!(allocation.spawned, 3);
        assert_eq!(a.active_agent_count(), 3);
        assert_eq!(pool.pool_size(), 8);
    }
}
