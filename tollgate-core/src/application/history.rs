// tollgate-core/src/application/history.rs

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::quality::Severity;
use crate::domain::table::Table;
use crate::error::TollgateError;
use crate::ports::connector::TableStore;

/// Findings recorded on one calendar day of the appended report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyErrorCount {
    pub day: NaiveDate,
    pub findings: usize,
    pub errors: usize,
}

/// Groups report rows by the day of their timestamp. Rows without a readable
/// timestamp are skipped.
pub fn count_by_day(report: &Table) -> Vec<DailyErrorCount> {
    let Some(timestamps) = report.column("timestamp") else {
        return Vec::new();
    };
    let severities = report.column("severity");

    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for (i, ts) in timestamps.values().iter().enumerate() {
        let Some(day) = ts.as_date() else { continue };
        let is_error = severities
            .and_then(|c| c.values()[i].as_text())
            .and_then(|s| s.parse::<Severity>().ok())
            .is_some_and(|s| s == Severity::Error);

        let entry = days.entry(day).or_default();
        entry.0 += 1;
        if is_error {
            entry.1 += 1;
        }
    }

    days.into_iter()
        .map(|(day, (findings, errors))| DailyErrorCount {
            day,
            findings,
            errors,
        })
        .collect()
}

/// Reads the appended validation report. A project that never produced a
/// finding has no report and an empty history.
pub async fn error_history(
    store: &dyn TableStore,
    report_path: &Path,
) -> Result<Vec<DailyErrorCount>, TollgateError> {
    if !report_path.exists() {
        tracing::debug!("No validation report at {}", report_path.display());
        return Ok(Vec::new());
    }
    let report = store.load_table(report_path).await?;
    Ok(count_by_day(&report))
}
