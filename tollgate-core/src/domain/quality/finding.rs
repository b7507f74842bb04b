// tollgate-core/src/domain/quality/finding.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Error taxonomy of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Structural,
    TypeMismatch,
    BusinessRule,
    StatisticalAnomaly,
    CheckerFailure,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::TypeMismatch => "type_mismatch",
            Self::BusinessRule => "business_rule",
            Self::StatisticalAnomaly => "statistical_anomaly",
            Self::CheckerFailure => "checker_failure",
        }
    }
}

/// Every data-quality problem a rule can report. The `Display` output is the finding message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QualityIssue {
    #[error("Missing expected column: {column}")]
    MissingColumn { column: String },

    #[error("Column {column} has unexpected type: {observed} (expected {expected})")]
    TypeMismatch {
        column: String,
        observed: String,
        expected: String,
    },

    #[error("Column {column} contains negative values")]
    NegativeValues { column: String },

    #[error("Column {column} contains values below {min}")]
    BelowMinimum { column: String, min: f64 },

    #[error("Column {column} contains values above {ceiling}")]
    AboveCeiling { column: String, ceiling: f64 },

    #[error("Values outside the allowed domain in '{column}'")]
    OutOfDomain { column: String },

    #[error("Future dates found in '{column}' (after {today})")]
    FutureDates { column: String, today: NaiveDate },

    #[error("Dates outside [{min}, {max}] found in '{column}'")]
    DatesOutOfRange {
        column: String,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("Column {column} contains null values")]
    NullValues { column: String },

    #[error("Column {column} contains duplicate values")]
    DuplicateValues { column: String },

    #[error("Values not matching pattern '{pattern}' in '{column}'")]
    PatternMismatch { column: String, pattern: String },

    #[error("Unexpected row count: {observed} (expected between {min}-{max})")]
    RowCount {
        observed: usize,
        min: usize,
        max: usize,
    },

    #[error("Checker '{checker}' failed: {reason}")]
    CheckerFailure { checker: String, reason: String },
}

impl QualityIssue {
    pub fn kind(&self) -> FindingKind {
        match self {
            Self::MissingColumn { .. } => FindingKind::Structural,
            Self::TypeMismatch { .. } => FindingKind::TypeMismatch,
            Self::NegativeValues { .. }
            | Self::BelowMinimum { .. }
            | Self::AboveCeiling { .. }
            | Self::OutOfDomain { .. }
            | Self::FutureDates { .. }
            | Self::DatesOutOfRange { .. }
            | Self::NullValues { .. }
            | Self::DuplicateValues { .. }
            | Self::PatternMismatch { .. } => FindingKind::BusinessRule,
            Self::RowCount { .. } => FindingKind::StatisticalAnomaly,
            Self::CheckerFailure { .. } => FindingKind::CheckerFailure,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            Self::MissingColumn { column }
            | Self::TypeMismatch { column, .. }
            | Self::NegativeValues { column }
            | Self::BelowMinimum { column, .. }
            | Self::AboveCeiling { column, .. }
            | Self::OutOfDomain { column }
            | Self::FutureDates { column, .. }
            | Self::DatesOutOfRange { column, .. }
            | Self::NullValues { column }
            | Self::DuplicateValues { column }
            | Self::PatternMismatch { column, .. } => Some(column),
            Self::RowCount { .. } | Self::CheckerFailure { .. } => None,
        }
    }
}

/// One reported validation outcome. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    rule_id: String,
    severity: Severity,
    kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    message: String,
}

impl Finding {
    pub fn new(rule_id: impl Into<String>, severity: Severity, issue: &QualityIssue) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            kind: issue.kind(),
            column: issue.column().map(str::to_string),
            message: issue.to_string(),
        }
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> FindingKind {
        self.kind
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_structural(&self) -> bool {
        self.kind == FindingKind::Structural
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.message)
    }
}
