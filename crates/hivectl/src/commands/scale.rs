use std::path::{Path, PathBuf};

use hivescale_coordinator::{ScaleReport, ScalingCoordinator};
use hivescale_state::open_store;
use tracing::info;

pub fn scale(
    config: Option<&Path>,
    paths: &[PathBuf],
    format: &str,
    prometheus: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let store = open_store(&config.store)?;
    let coordinator = ScalingCoordinator::new(&config, store);

    let mut reports = Vec::new();
    for path in paths {
        for task in super::load_tasks(path)? {
            let outcome = coordinator.analyze_and_scale(&task);
            match outcome.report() {
                Some(report) => {
                    if format != "json" {
                        println!("{}", format_report(report));
                    }
                    reports.push(report.clone());
                }
                None => info!(task = %task.id, "auto-scaling disabled, task skipped"),
            }
        }
    }

    let status = coordinator.status();
    match format {
        "json" => {
            let out = serde_json::json!({ "reports": reports, "status": status });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => println!(
            "pool: {}/{} agents ({} active, {} idle)",
            status.pool.size, status.pool.max_agents, status.pool.active, status.pool.idle
        ),
    }

    if prometheus {
        print!("{}", coordinator.prometheus());
    }

    coordinator.mark_complete();
    Ok(())
}

fn format_report(report: &ScaleReport) -> String {
    let decision = &report.decision;
    let ids: Vec<&str> = decision.agents.iter().map(|a| a.id.as_str()).collect();
    let mut line = format!(
        "{}: score {} ({}) → {}/{} agents [{}]",
        decision.task_id,
        decision.complexity_score,
        decision.complexity_level,
        decision.agents_allocated,
        decision.required_agents,
        ids.join(", ")
    );
    if decision.partial {
        line.push_str(" (partial)");
    }
    line
}
