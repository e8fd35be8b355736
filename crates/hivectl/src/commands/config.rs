use std::path::Path;

use hivescale_core::HiveConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let content = HiveConfig::scaffold();
    // the scaffold must stay loadable
    HiveConfig::parse(&content)?;
    std::fs::write(path, content)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}
