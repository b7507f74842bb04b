// tollgate-core/src/infrastructure/report/mod.rs

pub mod jinja;

use serde::Serialize;
use std::path::Path;

use crate::application::ports::TemplateEngine;
use crate::domain::error::DomainError;
use crate::domain::quality::Finding;
use crate::domain::table::{Column, SemanticType, Table, Value};
use crate::error::TollgateError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

pub use jinja::JinjaRenderer;

pub const HTML_TEMPLATE: &str = include_str!("template.html.j2");

/// Columns of the appended flat report.
pub const REPORT_COLUMNS: [&str; 6] = ["timestamp", "batch", "rule_id", "severity", "kind", "message"];

fn text_column(name: &str, findings: &[Finding], cell: impl Fn(&Finding) -> String) -> Column {
    Column::with_type(
        name,
        SemanticType::Text,
        findings.iter().map(|f| Value::Text(cell(f))).collect(),
    )
}

/// Flat, all-text rows for the appended CSV report, one per finding.
pub fn findings_table(
    batch: &str,
    timestamp: &str,
    findings: &[Finding],
) -> Result<Table, DomainError> {
    Table::new(vec![
        text_column(REPORT_COLUMNS[0], findings, |_| timestamp.to_string()),
        text_column(REPORT_COLUMNS[1], findings, |_| batch.to_string()),
        text_column(REPORT_COLUMNS[2], findings, |f| f.rule_id().to_string()),
        text_column(REPORT_COLUMNS[3], findings, |f| f.severity().to_string()),
        text_column(REPORT_COLUMNS[4], findings, |f| f.kind().as_str().to_string()),
        text_column(REPORT_COLUMNS[5], findings, |f| f.message().to_string()),
    ])
}

/// Pretty JSON, written atomically.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(data)?;
    atomic_write(path, content)
}

/// Renders the HTML batch report from any serializable report value.
pub fn write_html<T: Serialize>(
    engine: &dyn TemplateEngine,
    path: &Path,
    report: &T,
) -> Result<(), TollgateError> {
    let context = serde_json::to_value(report).map_err(InfrastructureError::from)?;
    let html = engine.render(HTML_TEMPLATE, &context)?;
    atomic_write(path, html)?;
    Ok(())
}
