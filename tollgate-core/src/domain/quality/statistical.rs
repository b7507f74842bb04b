// tollgate-core/src/domain/quality/statistical.rs
//
// Two granularities: aggregate health (row count) feeds the report, while the
// per-row IQR mask feeds routing.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::domain::quality::checker::{CheckContext, Checker, CheckerError, CheckerTier};
use crate::domain::quality::finding::{Finding, QualityIssue, Severity};
use crate::domain::quality::rule;
use crate::domain::table::Table;

pub const DEFAULT_IQR_K: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_row_count_bounds"))]
pub struct RowCountBounds {
    pub min: usize,
    pub max: usize,
}

fn validate_row_count_bounds(bounds: &RowCountBounds) -> Result<(), ValidationError> {
    if bounds.min > bounds.max {
        return Err(ValidationError::new("row_count_bounds").with_message(Cow::from(format!(
            "row_count.min ({}) is greater than row_count.max ({})",
            bounds.min, bounds.max
        ))));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StatisticalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub row_count: Option<RowCountBounds>,
}

/// Row count must lie in `[min, max]`.
pub fn check_row_count(table: &Table, min: usize, max: usize) -> Vec<Finding> {
    let observed = table.row_count();
    if observed < min || observed > max {
        return vec![Finding::new(
            rule::ROW_COUNT,
            Severity::Error,
            &QualityIssue::RowCount { observed, min, max },
        )];
    }
    Vec::new()
}

/// Linear-interpolated quantile of an ascending-sorted, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn from_quartiles(q1: f64, q3: f64, k: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        }
    }

    /// Quartiles over the non-missing values. `None` when nothing is left.
    pub fn from_values(values: &[Option<f64>], k: f64) -> Option<Self> {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        present.sort_by(f64::total_cmp);
        Some(Self::from_quartiles(
            quantile_sorted(&present, 0.25),
            quantile_sorted(&present, 0.75),
            k,
        ))
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Flags values outside the IQR fences. Missing values are never flagged.
pub fn iqr_outlier_mask(series: &[Option<f64>], k: f64) -> Vec<bool> {
    match IqrBounds::from_values(series, k) {
        Some(bounds) => series
            .iter()
            .map(|v| v.is_some_and(|x| bounds.is_outlier(x)))
            .collect(),
        None => vec![false; series.len()],
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticalChecker {
    config: StatisticalConfig,
}

impl StatisticalChecker {
    pub fn new(config: StatisticalConfig) -> Self {
        Self { config }
    }
}

impl Checker for StatisticalChecker {
    fn name(&self) -> &str {
        "statistical"
    }

    fn tier(&self) -> CheckerTier {
        CheckerTier::Statistical
    }

    fn check(&self, table: &Table, _ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError> {
        let mut findings = Vec::new();
        if let Some(bounds) = self.config.row_count {
            findings.extend(check_row_count(table, bounds.min, bounds.max));
        }
        Ok(findings)
    }
}
