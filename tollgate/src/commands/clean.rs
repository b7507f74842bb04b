// tollgate/src/commands/clean.rs
//
// USE CASE: Remove derived tiers and logs.

use std::path::PathBuf;

use tollgate_core::application::clean_project;
use tollgate_core::infrastructure::config::project::load_project_config;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir)?;
    match clean_project(&project_dir, &config) {
        Ok(removed) if removed.is_empty() => println!("🧹 Nothing to clean."),
        Ok(removed) => println!("🧹 {} target(s) removed.", removed.len()),
        Err(e) => {
            eprintln!("❌ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
