use std::path::Path;

use hivescale_coordinator::{ScalingDecision, StatusEvent, StatusRecord};
use hivescale_state::{SharedStore, get_json, open_store};

pub fn status(config: Option<&Path>, format: &str) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let store = open_store(&config.store)?;
    let snapshot = read_snapshot(&store, &config.coordinator.namespace)?;

    match format {
        "json" => {
            let out = serde_json::json!({
                "namespace": config.coordinator.namespace,
                "backend": store.backend(),
                "status": snapshot.status,
                "decisions": snapshot.decisions,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => println!("{}", format_snapshot(&config.coordinator.namespace, &snapshot)),
    }
    Ok(())
}

pub struct Snapshot {
    pub status: Option<StatusRecord>,
    pub decisions: Vec<ScalingDecision>,
}

/// Last status record plus every persisted decision, oldest first.
pub fn read_snapshot(store: &SharedStore, namespace: &str) -> anyhow::Result<Snapshot> {
    let status = get_json(store.as_ref(), &format!("{namespace}/status"))?;
    let mut decisions = store
        .list_prefix(&format!("{namespace}/decision-"))?
        .into_iter()
        .map(|(_, value)| serde_json::from_value::<ScalingDecision>(value))
        .collect::<Result<Vec<_>, _>>()?;
    decisions.sort_by_key(|d| d.timestamp);
    Ok(Snapshot { status, decisions })
}

fn format_snapshot(namespace: &str, snapshot: &Snapshot) -> String {
    let mut out = format!("namespace {namespace}\n");
    match &snapshot.status {
        Some(record) => {
            let summary = match &record.event {
                StatusEvent::ScaleUp {
                    task_id,
                    complexity_score,
                    agents_allocated,
                    ..
                } => format!("scale-up {task_id} (score {complexity_score}, {agents_allocated} agents)"),
                StatusEvent::ScaleDown { removed, remaining } => {
                    format!("scale-down removed {}, {remaining} remaining", removed.len())
                }
                StatusEvent::Optimize { removed } => format!("optimize removed {removed}"),
                StatusEvent::Rebalance { distribution } => {
                    let mix: Vec<String> =
                        distribution.iter().map(|(t, n)| format!("{t}={n}")).collect();
                    format!("rebalance {}", mix.join(" "))
                }
            };
            out.push_str(&format!("last action: {summary} at {}\n", record.last_updated));
        }
        None => out.push_str("last action: none\n"),
    }

    out.push_str(&format!("decisions: {}\n", snapshot.decisions.len()));
    for d in &snapshot.decisions {
        out.push_str(&format!(
            "  {:<20} {:>3} {:<8} {}/{}{}\n",
            d.task_id,
            d.complexity_score,
            d.complexity_level,
            d.agents_allocated,
            d.required_agents,
            if d.partial { " partial" } else { "" }
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hivescale_coordinator::ScalingCoordinator;
    use hivescale_core::{HiveConfig, Task};
    use hivescale_state::MemoryStore;

    use super::*;

    #[test]
    fn empty_store_has_no_status() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let snapshot = read_snapshot(&store, "ns").unwrap();
        assert!(snapshot.status.is_none());
        assert!(snapshot.decisions.is_empty());
        assert!(format_snapshot("ns", &snapshot).contains("last action: none"));
    }

    #[test]
    fn snapshot_reads_coordinator_records() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let config = HiveConfig::default();
        let coordinator = ScalingCoordinator::new(&config, store.clone());
        coordinator.analyze_and_scale(&Task::with_score("first", 25));
        coordinator.analyze_and_scale(&Task::with_score("second", 60));

        let snapshot = read_snapshot(&store, &config.coordinator.namespace).unwrap();
        assert_eq!(snapshot.decisions.len(), 2);
        let record = snapshot.status.as_ref().unwrap();
        assert!(matches!(&record.event, StatusEvent::ScaleUp { task_id, .. } if task_id == "second"));

        let text = format_snapshot(&config.coordinator.namespace, &snapshot);
        assert!(text.contains("last action: scale-up second (score 60"));
        assert!(text.contains("decisions: 2"));
    }
}
