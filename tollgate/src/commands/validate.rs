// tollgate/src/commands/validate.rs
//
// USE CASE: Validate one file, without routing or writing tiers.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::Table as Grid;
use tollgate_core::application::Validator;
use tollgate_core::domain::ports::TracingSink;
use tollgate_core::infrastructure::adapters::DuckDbStore;
use tollgate_core::infrastructure::config::project::load_project_config;
use tollgate_core::ports::TableStore;

pub async fn execute(project_dir: PathBuf, file: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir)
        .with_context(|| format!("Failed to load project configuration from {:?}", project_dir))?;
    let validator = Validator::from_rules(&config.rules)?;

    let store = DuckDbStore::in_memory()?;
    let table = store
        .load_table(&file)
        .await
        .with_context(|| format!("Failed to load {:?}", file))?;

    println!(
        "✅ Validating {} ({} rows, checkers: {})",
        file.display(),
        table.row_count(),
        validator.checker_names().join(", ")
    );

    let batch = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let report = validator.run(&table, &mut TracingSink::new(batch));

    if report.findings.is_empty() {
        println!("   No findings.");
    } else {
        let mut grid = Grid::new();
        grid.set_header(vec!["Severity", "Rule", "Kind", "Message"]);
        for f in &report.findings {
            grid.add_row(vec![
                f.severity().to_string(),
                f.rule_id().to_string(),
                f.kind().as_str().to_string(),
                f.message().to_string(),
            ]);
        }
        println!("{grid}");
    }

    if !report.passed {
        eprintln!("❌ Validation failed.");
        std::process::exit(1);
    }
    println!("✨ Validation passed.");
    Ok(())
}
