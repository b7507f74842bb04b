// tollgate/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Tabular data-quality gate: validate, route and aggregate batches", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs every bronze batch (Validation -> Routing -> Gold)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Run only one batch (file stem, ex: "sales")
        #[arg(long, short)]
        select: Option<String>,
    },

    /// ✅ Validates a single CSV file against the project rules (no routing)
    Validate {
        /// CSV file to validate
        #[arg(long, short)]
        file: PathBuf,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🔍 Inspects a CSV file (detected schema + sample rows)
    Inspect {
        /// CSV file to inspect
        #[arg(long, short)]
        file: PathBuf,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// 📈 Findings per day, read from the appended validation report
    History {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🌱 Writes the demo project and its error batch into data/bronze/
    Seed {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },

    /// 🧹 Removes derived tiers and logs (bronze is kept)
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
