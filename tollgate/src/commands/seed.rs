// tollgate/src/commands/seed.rs
//
// USE CASE: Scaffold the demo project (config + one bronze batch full of errors).

use std::fs;
use std::path::{Path, PathBuf};

use tollgate_core::infrastructure::config::project::load_project_config;

const DEMO_CONFIG: &str = include_str!("../../../demos/sales/tollgate.yaml");
const DEMO_RULES: &str = include_str!("../../../demos/sales/config/rules.yml");
const DEMO_ROUTING: &str = include_str!("../../../demos/sales/config/routing.yml");
const DEMO_GOLD: &str = include_str!("../../../demos/sales/config/gold.yml");
const DEMO_BATCH: &str = include_str!("../../../demos/sales/data/bronze/sales.csv");

pub fn execute(project_dir: PathBuf, force: bool) -> anyhow::Result<()> {
    println!("🌱 Seeding demo project in {}...", project_dir.display());

    // 1. Project files, unless the project already has its own
    let has_config = ["tollgate.yaml", "tollgate.yml"]
        .iter()
        .any(|f| project_dir.join(f).exists());
    if !has_config || force {
        write_file(&project_dir.join("tollgate.yaml"), DEMO_CONFIG, force)?;
        write_file(&project_dir.join("config/rules.yml"), DEMO_RULES, force)?;
        write_file(&project_dir.join("config/routing.yml"), DEMO_ROUTING, force)?;
        write_file(&project_dir.join("config/gold.yml"), DEMO_GOLD, force)?;
    }

    // 2. The error batch, where the project expects bronze input
    let config = load_project_config(&project_dir)?;
    let bronze = config.layout(&project_dir).bronze;
    write_file(&bronze.join("sales.csv"), DEMO_BATCH, force)?;

    println!("✨ Seed done. Try `tollgate run`.");
    Ok(())
}

fn write_file(path: &Path, content: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        println!("   ⏭️  Kept existing {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    println!("   📝 Wrote {}", path.display());
    Ok(())
}
