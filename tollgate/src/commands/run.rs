// tollgate/src/commands/run.rs
//
// USE CASE: Run every bronze batch through the gate.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tollgate_core::application::{RunOptions, run_pipeline};
use tollgate_core::infrastructure::adapters::DuckDbStore;
use tollgate_core::infrastructure::config::project::load_project_config;
use tollgate_core::infrastructure::report::JinjaRenderer;

pub async fn execute(project_dir: PathBuf, select: Option<String>) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    tracing::debug!(?project_dir, ?select, "Run requested");

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);

    // B. Adapters
    let store = Arc::new(DuckDbStore::in_memory().context("Failed to initialize DuckDB")?);
    let renderer = Arc::new(JinjaRenderer::new());

    // C. Run the Pipeline (Application Layer)
    let options = RunOptions {
        select,
        ..RunOptions::default()
    };
    let result = run_pipeline(&project_dir, &config, store, renderer, options).await;

    match result {
        Ok(run_res) => {
            if run_res.success {
                println!("\n✨ SUCCESS! Run finished in {:.2?}", start.elapsed());
            } else {
                eprintln!(
                    "\n❌ FAILURE. {} batch(es) failed, {} batch(es) with failing validation.",
                    run_res.failures.len(),
                    run_res.failed_validations()
                );
                // Exit with error code for CI/CD
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL RUN ERROR:");
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }

    Ok(())
}
