use std::path::Path;

use hivescale_autoscale::infer_agent_type;
use hivescale_complexity::{ComplexityDetector, ComplexityMetrics};
use hivescale_core::{HiveConfig, Task};

pub fn score(config: Option<&Path>, path: &Path, format: &str) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let detector = detector(&config);
    let tasks = super::load_tasks(path)?;

    for task in &tasks {
        let metrics = detector.complexity_metrics(task);
        let score = task.precomputed_score().unwrap_or_else(|| metrics.score());
        match format {
            "json" => {
                let out = serde_json::json!({
                    "task_id": task.id,
                    "score": score,
                    "level": detector.classify(score),
                    "recommended_agents": detector.recommend_agent_count(
                        score,
                        config.scaler.min_agents,
                        config.scaler.max_agents,
                    ),
                    "agent_type": infer_agent_type(&task.description),
                    "metrics": metrics,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            _ => println!("{}", format_score(&detector, &config, task, score, &metrics)),
        }
    }
    Ok(())
}

pub fn detector(config: &HiveConfig) -> ComplexityDetector {
    ComplexityDetector::new()
        .with_weights(config.complexity.weights)
        .with_curve(config.scaler.thresholds)
}

fn format_score(
    detector: &ComplexityDetector,
    config: &HiveConfig,
    task: &Task,
    score: u32,
    metrics: &ComplexityMetrics,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} ({})\n",
        task.id,
        score,
        detector.classify(score)
    ));
    out.push_str(&format!(
        "  agents      {} x {}\n",
        detector.recommend_agent_count(score, config.scaler.min_agents, config.scaler.max_agents),
        infer_agent_type(&task.description)
    ));
    out.push_str(&format!("  description {}\n", metrics.description_score));
    out.push_str(&format!("  files       {}\n", metrics.file_count_score));
    out.push_str(&format!("  deps        {}\n", metrics.dependency_score));
    out.push_str(&format!("  code        {}\n", metrics.code_complexity_score));
    out.push_str(&format!("  cross-cut   {}\n", metrics.cross_cutting_score));
    out.push_str(&format!("  parallel    +{}\n", metrics.parallelizable_bonus));
    if !metrics.triggered_rules.is_empty() {
        out.push_str(&format!(
            "  rules       +{} ({})\n",
            metrics.rule_bonus,
            metrics.triggered_rules.join(", ")
        ));
    }
    if task.precomputed_score().is_some() {
        out.push_str(&format!(
            "  (precomputed; detector says {})\n",
            metrics.score()
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_report_names_level_and_agents() {
        let config = HiveConfig::default();
        let detector = detector(&config);
        let task = Task::new("t1", "Write tests for the parser");
        let metrics = detector.complexity_metrics(&task);
        let score = metrics.score();
        let text = format_score(&detector, &config, &task, score, &metrics);

        assert!(text.starts_with(&format!("t1: {score} (low)")));
        assert!(text.contains("x tester"));
        assert!(!text.contains("precomputed"));
    }

    #[test]
    fn precomputed_score_is_flagged() {
        let config = HiveConfig::default();
        let detector = detector(&config);
        let task = Task::with_score("t2", 85);
        let metrics = detector.complexity_metrics(&task);
        let text = format_score(&detector, &config, &task, 85, &metrics);
        assert!(text.starts_with("t2: 85 (high)"));
        assert!(text.contains("agents      8 x coder"));
        assert!(text.contains("precomputed"));
    }
}
