//! End-to-end scaling scenarios.
//!
//! Drives the coordinator the way a host would: tasks in, agents out,
//! completions back, periodic reclaim, with in-memory, failing, and
//! on-disk coordination stores.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hivescale_autoscale::{AutoScaler, ScaleDownOptions};
use hivescale_complexity::ComplexityDetector;
use hivescale_coordinator::{ScalingCoordinator, ScalingDecision};
use hivescale_core::{AgentType, ComplexityLevel, HiveConfig, ManualClock, Task};
use hivescale_pool::{AgentPool, SpawnConfig, TaskOutcome};
use hivescale_state::{
    CoordinationStore, MemoryStore, RedbStore, StoreError, StoreResult, get_json,
};
use serde_json::Value;

const START_MS: u64 = 1_700_000_000_000;

fn test_coordinator() -> (ScalingCoordinator, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = Arc::new(MemoryStore::new());
    let coordinator =
        ScalingCoordinator::with_clock(&HiveConfig::default(), store.clone(), clock.clone());
    (coordinator, clock, store)
}

fn decision(coordinator: &ScalingCoordinator, task: &Task) -> ScalingDecision {
    coordinator
        .analyze_and_scale(task)
        .report()
        .expect("auto-scaling is enabled")
        .decision
        .clone()
}

/// Store whose every call fails.
struct FailingStore;

impl CoordinationStore for FailingStore {
    fn store(&self, _key: &str, _value: &Value) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn retrieve(&self, _key: &str) -> StoreResult<Option<Value>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn list_prefix(&self, _prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

// ── Scenarios ─────────────────────────────────────────────────────

#[test]
fn low_complexity_task_gets_three_coders() {
    let (coordinator, _, _) = test_coordinator();
    let decision = decision(&coordinator, &Task::with_score("low", 25));

    assert_eq!(decision.complexity_level, ComplexityLevel::Low);
    assert_eq!(decision.agents_allocated, 3);
    assert!(decision.agents.iter().all(|a| a.agent_type == AgentType::Coder));
    assert!(!decision.partial);
}

#[test]
fn high_complexity_task_gets_eight_to_twelve() {
    let (coordinator, _, _) = test_coordinator();
    let decision = decision(&coordinator, &Task::with_score("high", 85));

    assert_eq!(decision.complexity_level, ComplexityLevel::High);
    assert!((8..=12).contains(&decision.agents_allocated));
    assert_eq!(coordinator.pool().pool_size(), decision.agents_allocated);
}

#[test]
fn scale_down_reclaims_two_worst_idle_agents() {
    let (coordinator, clock, _) = test_coordinator();
    let decision = decision(&coordinator, &Task::with_score("big", 80));
    assert_eq!(decision.agents_allocated, 8);
    assert_eq!(coordinator.scaler().active_agent_count(), 8);

    let finished = &decision.agents[..3];
    coordinator.complete_task(&finished[0].id, TaskOutcome::succeeded(800));
    coordinator.complete_task(&finished[1].id, TaskOutcome::failed(12_000));
    coordinator.complete_task(&finished[2].id, TaskOutcome::succeeded(6_000));
    clock.advance(Duration::from_secs(60));

    let report = coordinator.scale_down(ScaleDownOptions {
        max_remove: Some(2),
        idle_timeout_ms: Some(30_000),
    });

    // performances: 0.976, 0.0, 0.82 → the failed and the slow one go
    let removed: HashSet<&str> = report.removed.iter().map(String::as_str).collect();
    let expected: HashSet<&str> = [finished[1].id.as_str(), finished[2].id.as_str()].into();
    assert_eq!(removed, expected);
    assert_eq!(report.remaining, 6);
    assert_eq!(coordinator.scaler().active_agent_count(), 6);
    assert!(coordinator.pool().get_agent(&finished[0].id).is_some());
}

#[test]
fn rebalance_shifts_coders_to_testers() {
    let (coordinator, _, _) = test_coordinator();
    let pool = coordinator.pool();
    for _ in 0..8 {
        pool.spawn_agent(SpawnConfig::of_type(AgentType::Coder)).unwrap();
    }
    pool.spawn_agent(SpawnConfig::of_type(AgentType::Tester)).unwrap();

    let desired = BTreeMap::from([(AgentType::Coder, 5), (AgentType::Tester, 3)]);
    let report = coordinator.rebalance_pool(&desired);

    assert_eq!(report.distribution[&AgentType::Coder], 5);
    assert_eq!(report.distribution[&AgentType::Tester], 3);
    assert!(report.pool_size <= pool.max_agents());
}

// ── Invariants under load ─────────────────────────────────────────

#[test]
fn concurrent_tasks_never_exceed_pool_capacity() {
    let (coordinator, _, _) = test_coordinator();
    let coordinator = Arc::new(coordinator);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = coordinator.clone();
            thread::spawn(move || {
                for j in 0..5 {
                    let task = Task::with_score(format!("t{i}-{j}"), (i * 13 + j * 7) % 101);
                    let outcome = coordinator.analyze_and_scale(&task);
                    let decision = &outcome.report().unwrap().decision;
                    assert!(decision.agents_allocated <= 12);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(coordinator.pool().pool_size() <= 12);
    assert!(coordinator.scaler().active_agent_count() <= 12);
}

#[test]
fn two_scalers_never_share_an_agent() {
    let pool = Arc::new(AgentPool::new(12));
    for _ in 0..6 {
        pool.spawn_agent(SpawnConfig::default()).unwrap();
    }
    let left = Arc::new(AutoScaler::new(pool.clone(), ComplexityDetector::new()));
    let right = Arc::new(AutoScaler::new(pool.clone(), ComplexityDetector::new()));

    let spawn_scaler = |scaler: Arc<AutoScaler>, name: &'static str| {
        thread::spawn(move || {
            scaler.scale_for_task(&Task::with_score(name, 80));
        })
    };
    let a = spawn_scaler(left.clone(), "left");
    let b = spawn_scaler(right.clone(), "right");
    a.join().unwrap();
    b.join().unwrap();

    let left_ids: HashSet<String> = left.tracked_agents().into_iter().map(|a| a.id).collect();
    let right_ids: HashSet<String> = right.tracked_agents().into_iter().map(|a| a.id).collect();
    assert!(left_ids.is_disjoint(&right_ids));
    assert_eq!(left_ids.len() + right_ids.len(), 12);
    assert_eq!(pool.pool_size(), 12);
}

// ── Persistence ───────────────────────────────────────────────────

#[test]
fn failing_store_never_fails_scaling() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let coordinator =
        ScalingCoordinator::with_clock(&HiveConfig::default(), Arc::new(FailingStore), clock);

    let decision = decision(&coordinator, &Task::with_score("t1", 60));
    assert_eq!(decision.agents_allocated, 5);

    assert!(coordinator.complexity_analysis("t1").is_none());
    assert!(coordinator.scale_down(ScaleDownOptions::default()).removed.is_empty());
    coordinator.optimize_pool();
    coordinator.set_auto_scale(true);
    coordinator.mark_complete();
    assert_eq!(coordinator.metrics().aggregate.total_agents, 5);
}

#[test]
fn complexity_analysis_reads_back_from_store() {
    let (coordinator, _, _) = test_coordinator();
    let task = Task::new("deploy", "Deploy microservice to kubernetes cluster")
        .files(["k8s/deployment.yaml", "Dockerfile"])
        .dependencies(["kubernetes", "docker"]);
    let decision = decision(&coordinator, &task);

    let record = coordinator.complexity_analysis("deploy").unwrap();
    assert_eq!(record.score, decision.complexity_score);
    assert_eq!(record.level, decision.complexity_level);
    assert!(record.metrics.triggered_rules.iter().any(|r| r == "deployment"));
    assert!(coordinator.complexity_analysis("never-seen").is_none());
}

#[test]
fn decisions_survive_in_redb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordination.redb");
    let namespace;
    {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let coordinator = ScalingCoordinator::new(&HiveConfig::default(), store);
        namespace = coordinator.namespace().to_string();
        decision(&coordinator, &Task::with_score("persisted", 25));
    }

    let store = RedbStore::open(&path).unwrap();
    let decision: ScalingDecision = get_json(&store, &format!("{namespace}/decision-persisted"))
        .unwrap()
        .unwrap();
    assert_eq!(decision.agents_allocated, 3);

    let decisions = store.list_prefix(&format!("{namespace}/decision-")).unwrap();
    assert_eq!(decisions.len(), 1);
}

// ── Background loop ───────────────────────────────────────────────

#[tokio::test]
async fn run_loop_reclaims_until_floor_and_stops_on_shutdown() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let mut config = HiveConfig::default();
    config.coordinator.scale_down_interval = "5ms".to_string();
    let coordinator = Arc::new(ScalingCoordinator::with_clock(
        &config,
        Arc::new(MemoryStore::new()),
        clock.clone(),
    ));
    assert_eq!(coordinator.scale_down_interval(), Duration::from_millis(5));

    let decision = decision(&coordinator, &Task::with_score("t1", 60));
    for agent in &decision.agents {
        coordinator.complete_task(&agent.id, TaskOutcome::succeeded(1_000));
    }
    clock.advance(Duration::from_secs(120));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let runner = coordinator.clone();
    let handle = tokio::spawn(async move {
        runner.run(shutdown_rx).await;
    });

    for _ in 0..200 {
        if coordinator.scaler().active_agent_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(coordinator.scaler().active_agent_count(), 1);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop exits on shutdown")
        .unwrap();
}
