// tollgate-core/src/application/pipeline.rs

use chrono::NaiveDate;
use futures::StreamExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};
use walkdir::WalkDir;

use crate::error::TollgateError;
use crate::ports::connector::TableStore;

// Application Services
use crate::application::ports::TemplateEngine;
use crate::application::validation::{ValidationReport, Validator};

// Domain
use crate::domain::error::DomainError;
use crate::domain::gold::{AggregateView, GoldConfig, aggregate};
use crate::domain::ports::TracingSink;
use crate::domain::project::{ProjectConfig, ProjectLayout};
use crate::domain::quality::CheckContext;
use crate::domain::routing::{Router, RoutingOutcome, RoutingSummary};
use crate::domain::table::{Column, SemanticType, Table, Value};

// Infrastructure
use crate::infrastructure::report::{findings_table, write_html, write_json};

pub const VALIDATION_REPORT: &str = "validation_report.csv";
pub const RUN_RESULTS: &str = "run_results.json";
pub const REASONS_COLUMN: &str = "reject_reasons";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only the batch with this file stem.
    pub select: Option<String>,
    /// Reference date for "future" checks. Defaults to the local date.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutputs {
    pub silver: PathBuf,
    pub quarantine: PathBuf,
    pub gold: PathBuf,
    pub views: Vec<PathBuf>,
    pub json_report: PathBuf,
    pub html_report: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch: String,
    pub source: PathBuf,
    pub generated_at: String,
    pub validation: ValidationReport,
    pub routing: RoutingSummary,
    pub reject_reasons: BTreeMap<String, usize>,
    pub views: Vec<AggregateView>,
    pub outputs: BatchOutputs,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub batch: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Every batch processed and every validation passed.
    pub success: bool,
    pub batches: Vec<BatchResult>,
    pub failures: Vec<BatchFailure>,
}

impl RunResult {
    pub fn failed_validations(&self) -> usize {
        self.batches.iter().filter(|b| !b.validation.passed).count()
    }
}

// Shared by every batch of one run.
struct BatchContext<'a> {
    store: &'a dyn TableStore,
    renderer: &'a dyn TemplateEngine,
    validator: &'a Validator,
    router: &'a Router,
    gold: &'a GoldConfig,
    layout: &'a ProjectLayout,
    today: NaiveDate,
}

/// Bronze CSV files, sorted by name. `select` keeps the one with that stem.
pub fn discover_batches(bronze: &Path, select: Option<&str>) -> Vec<PathBuf> {
    let mut batches: Vec<PathBuf> = WalkDir::new(bronze)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .filter(|p| select.is_none_or(|s| batch_name(p) == s))
        .collect();
    batches.sort();
    batches
}

fn batch_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub async fn run_pipeline(
    project_dir: &Path,
    config: &ProjectConfig,
    store: Arc<dyn TableStore>,
    renderer: Arc<dyn TemplateEngine>,
    options: RunOptions,
) -> Result<RunResult, TollgateError> {
    println!("🚀 Starting tollgate run for '{}'...", config.name);
    let start_time = std::time::Instant::now();

    // 1. CONFIG (fatal errors stop here, before any batch is read)
    config.ensure_valid()?;
    let validator = Validator::from_rules(&config.rules)?;
    let router = Router::new(config.routing_policy()?.clone())?;
    let layout = config.layout(project_dir);
    let today = options
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    // 2. DISCOVERY
    let batches = discover_batches(&layout.bronze, options.select.as_deref());
    if batches.is_empty() {
        return Err(TollgateError::NoBatches(layout.bronze.display().to_string()));
    }
    println!(
        "📦 {} batch(es) found in {} (engine: {})",
        batches.len(),
        layout.bronze.display(),
        store.engine_name()
    );

    // 3. EXECUTION (independent batches, bounded concurrency)
    let ctx = BatchContext {
        store: store.as_ref(),
        renderer: renderer.as_ref(),
        validator: &validator,
        router: &router,
        gold: &config.gold,
        layout: &layout,
        today,
    };
    let ctx = &ctx;
    let futures = batches.iter().map(|path| async move {
        (batch_name(path), process_batch(ctx, path).await)
    });
    let mut results: Vec<_> = futures::stream::iter(futures)
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut processed = Vec::new();
    let mut failures = Vec::new();
    for (batch, res) in results {
        match res {
            Ok(result) => {
                let status = if result.validation.passed { "✅" } else { "⚠️ " };
                println!(
                    "  {} {}: {} clean, {} quarantined, {} finding(s)",
                    status,
                    batch,
                    result.routing.clean_rows,
                    result.routing.quarantine_rows,
                    result.validation.findings.len()
                );
                processed.push(result);
            }
            Err(e) => {
                eprintln!("  ❌ Error processing {}: {}", batch, e);
                failures.push(BatchFailure {
                    batch,
                    error: e.to_string(),
                });
            }
        }
    }

    // 4. FINALIZE
    let result = RunResult {
        success: failures.is_empty() && processed.iter().all(|b| b.validation.passed),
        batches: processed,
        failures,
    };
    write_json(&layout.logs.join(RUN_RESULTS), &result)?;

    println!(
        "✨ Done in {:.2}s. {} batch(es) processed, {} failed.",
        start_time.elapsed().as_secs_f64(),
        result.batches.len(),
        result.failures.len()
    );
    Ok(result)
}

/// Load -> validate -> report -> route -> tiers -> gold, for one bronze file.
#[instrument(skip(ctx), fields(path = %path.display()))]
async fn process_batch(ctx: &BatchContext<'_>, path: &Path) -> Result<BatchResult, TollgateError> {
    let batch = batch_name(path);
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut sink = TracingSink::new(&batch);

    // A. Load
    let table = ctx.store.load_table(path).await?;
    info!(batch = %batch, rows = table.row_count(), "Batch loaded");

    // B. Validation (never stops the batch)
    let validation = ctx
        .validator
        .run_at(&table, &CheckContext::new(ctx.today), &mut sink);
    if !validation.findings.is_empty() {
        let rows = findings_table(&batch, &generated_at, &validation.findings)?;
        ctx.store
            .append_table(&rows, &ctx.layout.logs.join(VALIDATION_REPORT))
            .await?;
    }

    // C. Routing
    let outcome = ctx.router.route(&table, ctx.today, &mut sink)?;
    let silver = ctx.layout.silver.join(format!("{}_silver.csv", batch));
    let quarantine = ctx.layout.quarantine.join(format!("{}_quarantine.csv", batch));
    ctx.store.write_table(&outcome.clean, &silver).await?;
    ctx.store
        .write_table(&annotate_quarantine(&outcome)?, &quarantine)
        .await?;

    // D. Gold (recomputed in full, files overwritten)
    let gold = ctx.layout.gold.join(format!("{}_gold.csv", batch));
    ctx.store.write_table(&outcome.clean, &gold).await?;
    let views = aggregate(&outcome.clean, ctx.gold, &ctx.router.policy().fields)?;
    let mut view_paths = Vec::with_capacity(views.len());
    for view in &views {
        let view_path = ctx
            .layout
            .gold
            .join(format!("{}_gold_{}.csv", batch, view.name));
        ctx.store.write_table(&view.to_table()?, &view_path).await?;
        view_paths.push(view_path);
    }

    // E. Reports
    let mut reject_reasons = BTreeMap::new();
    for reason in outcome.reasons.iter().flatten() {
        *reject_reasons.entry(reason.code().to_string()).or_insert(0) += 1;
    }
    let json_report = ctx.layout.logs.join(format!("{}_report.json", batch));
    let html_report = ctx.layout.logs.join(format!("{}_report.html", batch));
    let result = BatchResult {
        batch,
        source: path.to_path_buf(),
        generated_at,
        validation,
        routing: outcome.summary(),
        reject_reasons,
        views,
        outputs: BatchOutputs {
            silver,
            quarantine,
            gold,
            views: view_paths,
            json_report: json_report.clone(),
            html_report: html_report.clone(),
        },
    };
    write_json(&json_report, &result)?;
    write_html(ctx.renderer, &html_report, &result)?;

    Ok(result)
}

/// Quarantine tier plus a trailing column listing why each row was rejected.
/// An input column already named `reject_reasons` is an error, never overwritten.
pub fn annotate_quarantine(outcome: &RoutingOutcome) -> Result<Table, TollgateError> {
    if outcome.quarantine.has_column(REASONS_COLUMN) {
        return Err(DomainError::SchemaError(format!(
            "Input column '{}' collides with the quarantine annotation",
            REASONS_COLUMN
        ))
        .into());
    }
    let reasons = outcome
        .reasons
        .iter()
        .map(|r| {
            Value::Text(
                r.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })
        .collect();
    let table = outcome
        .quarantine
        .clone()
        .with_column(Column::with_type(REASONS_COLUMN, SemanticType::Text, reasons))?;
    Ok(table)
}
