// tollgate/src/commands/history.rs
//
// USE CASE: Findings per calendar day, from logs/validation_report.csv.

use std::path::PathBuf;

use comfy_table::Table as Grid;
use tollgate_core::application::error_history;
use tollgate_core::application::pipeline::VALIDATION_REPORT;
use tollgate_core::infrastructure::adapters::DuckDbStore;
use tollgate_core::infrastructure::config::project::load_project_config;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir)?;
    let report_path = config.layout(&project_dir).logs.join(VALIDATION_REPORT);

    let store = DuckDbStore::in_memory()?;
    let history = error_history(&store, &report_path).await?;

    if history.is_empty() {
        println!("📈 No findings recorded yet ({}).", report_path.display());
        return Ok(());
    }

    let mut grid = Grid::new();
    grid.set_header(vec!["Day", "Findings", "Errors"]);
    for day in &history {
        grid.add_row(vec![
            day.day.to_string(),
            day.findings.to_string(),
            day.errors.to_string(),
        ]);
    }
    println!("📈 Findings per day:");
    println!("{grid}");

    Ok(())
}
