pub mod config;
pub mod scale;
pub mod score;
pub mod status;

use std::path::Path;

use anyhow::Context;
use hivescale_core::{HiveConfig, Task};

/// Config from `--config`, else `./hive.toml` if present, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<HiveConfig> {
    match path {
        Some(path) => HiveConfig::from_file(path),
        None => {
            let local = Path::new("hive.toml");
            if local.exists() {
                HiveConfig::from_file(local)
            } else {
                Ok(HiveConfig::default())
            }
        }
    }
}

/// Read a task file: one JSON task object or an array of them.
pub fn load_tasks(path: &Path) -> anyhow::Result<Vec<Task>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    let tasks = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(tasks)
}
