// tollgate/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug tollgate run ... pour voir les détails
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            select,
        } => commands::run::execute(project_dir, select).await,
        Commands::Validate { file, project_dir } => {
            commands::validate::execute(project_dir, file).await
        }
        Commands::Inspect { file, limit } => commands::inspect::execute(file, limit).await,
        Commands::History { project_dir } => commands::history::execute(project_dir).await,
        Commands::Seed { project_dir, force } => commands::seed::execute(project_dir, force),
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
