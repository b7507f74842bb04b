// tollgate-core/src/application/mod.rs

pub mod clean;
pub mod history;
pub mod ports;

pub mod pipeline;
pub mod validation;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Le CLI fait `use tollgate_core::application::{run_pipeline, Validator};`
// sans connaître la structure interne des fichiers.

pub use clean::clean_project;
pub use history::{DailyErrorCount, count_by_day, error_history};
pub use pipeline::{BatchResult, RunOptions, RunResult, run_pipeline};
pub use validation::{ValidationReport, Validator};
