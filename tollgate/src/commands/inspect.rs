// tollgate/src/commands/inspect.rs
//
// USE CASE: Inspect a CSV file as the loader sees it (schema + sample rows).

use std::path::PathBuf;

use comfy_table::Table as Grid;
use tollgate_core::infrastructure::adapters::DuckDbStore;
use tollgate_core::ports::TableStore;

pub async fn execute(file: PathBuf, limit: usize) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("❌ File not found at: {}", file.display());
    }

    let store = DuckDbStore::in_memory()?;
    let table = store.load_table(&file).await?;

    println!("\n🔍 Inspecting: '{}' ({} rows)", file.display(), table.row_count());
    let schema: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("{}: {}", c.name(), c.dtype()))
        .collect();
    println!("   Columns: [{}]", schema.join(", "));

    let mut grid = Grid::new();
    grid.set_header(table.column_names());
    for i in 0..table.row_count().min(limit) {
        if let Some(row) = table.row(i) {
            grid.add_row(row.iter().map(|v| v.to_string()).collect::<Vec<_>>());
        }
    }
    println!("{grid}");

    Ok(())
}
