//! Prometheus text exposition format.
//!
//! Every series carries a `scope` label (the coordinator namespace) so
//! several coordinators can share one scrape target.

use std::collections::BTreeMap;

use hivescale_autoscale::ScalerStats;
use hivescale_core::AgentType;
use hivescale_pool::Agent;

/// Render scaler statistics and per-agent state in Prometheus text format.
pub fn render_prometheus(scope: &str, stats: &ScalerStats, agents: &[Agent]) -> String {
    let mut out = String::new();
    let scope = escape_label(scope);

    let gauges: [(&str, &str, String); 7] = [
        (
            "hivescale_agents_tracked",
            "Agents allocated by the scaler.",
            stats.active_agents.to_string(),
        ),
        (
            "hivescale_agents_idle",
            "Tracked agents currently idle.",
            stats.idle_agents.to_string(),
        ),
        (
            "hivescale_agents_reclaimable",
            "Tracked agents idle past the scale-down timeout.",
            stats.reclaimable_agents.to_string(),
        ),
        (
            "hivescale_pool_agents",
            "Agents in the pool.",
            stats.total_agents.to_string(),
        ),
        (
            "hivescale_pool_max_agents",
            "Configured scaler ceiling.",
            stats.max_agents.to_string(),
        ),
        (
            "hivescale_pool_min_agents",
            "Configured scaler floor.",
            stats.min_agents.to_string(),
        ),
        (
            "hivescale_pool_utilization",
            "Pool size over the scaler ceiling (0.0-1.0).",
            format!("{:.4}", stats.pool_utilization),
        ),
    ];
    for (name, help, value) in &gauges {
        out.push_str(&format!("# HELP {name} {help}\n"));
        out.push_str(&format!("# TYPE {name} gauge\n"));
        out.push_str(&format!("{name}{{scope=\"{scope}\"}} {value}\n"));
    }

    let events = &stats.events;
    let counters: [(&str, &str, u64); 6] = [
        ("hivescale_scale_ups_total", "Scale-up events.", events.scale_ups),
        ("hivescale_scale_downs_total", "Scale-down events.", events.scale_downs),
        ("hivescale_agents_spawned_total", "Agents spawned for tasks.", events.agents_spawned),
        ("hivescale_agents_reused_total", "Idle pool agents reused for tasks.", events.agents_reused),
        ("hivescale_agents_released_total", "Agents released from the working set.", events.agents_released),
        ("hivescale_agents_removed_total", "Agents removed by scale-down.", events.agents_removed),
    ];
    for (name, help, value) in &counters {
        out.push_str(&format!("# HELP {name} {help}\n"));
        out.push_str(&format!("# TYPE {name} counter\n"));
        out.push_str(&format!("{name}{{scope=\"{scope}\"}} {value}\n"));
    }

    let mut by_type: BTreeMap<AgentType, usize> = BTreeMap::new();
    for agent in agents {
        *by_type.entry(agent.agent_type).or_insert(0) += 1;
    }
    out.push_str("# HELP hivescale_agents_by_type Pool agents per role.\n");
    out.push_str("# TYPE hivescale_agents_by_type gauge\n");
    for (agent_type, count) in &by_type {
        out.push_str(&format!(
            "hivescale_agents_by_type{{scope=\"{scope}\",type=\"{agent_type}\"}} {count}\n"
        ));
    }

    out.push_str("# HELP hivescale_agent_performance Agent performance (0.0-1.0).\n");
    out.push_str("# TYPE hivescale_agent_performance gauge\n");
    for a in agents {
        out.push_str(&format!(
            "hivescale_agent_performance{{scope=\"{scope}\",agent=\"{}\",type=\"{}\"}} {:.4}\n",
            escape_label(&a.id),
            a.agent_type,
            a.performance
        ));
    }

    out.push_str("# HELP hivescale_agent_active Whether the agent is working on a task.\n");
    out.push_str("# TYPE hivescale_agent_active gauge\n");
    for a in agents {
        out.push_str(&format!(
            "hivescale_agent_active{{scope=\"{scope}\",agent=\"{}\"}} {}\n",
            escape_label(&a.id),
            u8::from(a.is_active())
        ));
    }

    out.push_str("# HELP hivescale_agent_tasks_completed_total Tasks completed per agent.\n");
    out.push_str("# TYPE hivescale_agent_tasks_completed_total counter\n");
    for a in agents {
        out.push_str(&format!(
            "hivescale_agent_tasks_completed_total{{scope=\"{scope}\",agent=\"{}\"}} {}\n",
            escape_label(&a.id),
            a.tasks_completed
        ));
    }

    out
}

/// Escape a label value: backslash, double quote, newline.
fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
