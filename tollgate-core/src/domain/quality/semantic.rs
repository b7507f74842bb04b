// tollgate-core/src/domain/quality/semantic.rs
//
// Business invariants, reported at column granularity: a column either passes or
// yields one finding, however many rows offend. Row remediation is the router's job.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::quality::checker::{CheckContext, Checker, CheckerError, CheckerTier};
use crate::domain::quality::finding::{Finding, QualityIssue, Severity};
use crate::domain::quality::rule::{self, column_rule};
use crate::domain::table::{Table, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum SemanticCheck {
    NonNegative { column: String },
    MinValue { column: String, min: f64 },
    MaxValue { column: String, max: f64 },
    Domain {
        column: String,
        allowed: Vec<String>,
        /// Compare uppercased codes, as the router does with `normalize_currency`.
        #[serde(default)]
        normalize: bool,
    },
    NotFuture { column: String },
    DateRange { column: String, min: NaiveDate, max: NaiveDate },
    NotNull { column: String },
    Unique { column: String },
    Pattern { column: String, pattern: String },
}

impl SemanticCheck {
    pub fn column(&self) -> &str {
        match self {
            Self::NonNegative { column }
            | Self::MinValue { column, .. }
            | Self::MaxValue { column, .. }
            | Self::Domain { column, .. }
            | Self::NotFuture { column }
            | Self::DateRange { column, .. }
            | Self::NotNull { column }
            | Self::Unique { column }
            | Self::Pattern { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRule {
    #[serde(flatten)]
    pub check: SemanticCheck,
    #[serde(default)]
    pub severity: Severity,
}

impl From<SemanticCheck> for SemanticRule {
    fn from(check: SemanticCheck) -> Self {
        Self {
            check,
            severity: Severity::Error,
        }
    }
}

// --- COLUMN-LEVEL RULES ---

/// Any coerced value below zero fails the column. Non-numeric values count as missing.
pub fn check_non_negative(table: &Table, column: &str) -> Vec<Finding> {
    non_negative(table, column, Severity::Error)
}

/// Every value (nulls included) must belong to `allowed`.
pub fn check_domain<S: AsRef<str>>(table: &Table, column: &str, allowed: &[S]) -> Vec<Finding> {
    let allowed: HashSet<String> = allowed.iter().map(|a| a.as_ref().to_string()).collect();
    domain(table, column, &allowed, false, Severity::Error)
}

/// Parsed dates strictly after `today` fail the column. Unparseable dates are missing, not violations.
pub fn check_not_future(table: &Table, column: &str, today: NaiveDate) -> Vec<Finding> {
    not_future(table, column, today, Severity::Error)
}

fn non_negative(table: &Table, column: &str, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::NON_NEGATIVE, column, severity, |col| {
        any_value(col.values(), |v| v.as_f64().is_some_and(|x| x < 0.0)).then(|| {
            QualityIssue::NegativeValues {
                column: column.to_string(),
            }
        })
    })
}

fn min_value(table: &Table, column: &str, min: f64, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::MIN_VALUE, column, severity, |col| {
        any_value(col.values(), |v| v.as_f64().is_some_and(|x| x < min)).then(|| {
            QualityIssue::BelowMinimum {
                column: column.to_string(),
                min,
            }
        })
    })
}

fn max_value(table: &Table, column: &str, max: f64, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::MAX_VALUE, column, severity, |col| {
        any_value(col.values(), |v| v.as_f64().is_some_and(|x| x > max)).then(|| {
            QualityIssue::AboveCeiling {
                column: column.to_string(),
                ceiling: max,
            }
        })
    })
}

/// `allowed` must already be uppercased when `normalize` is set.
fn domain(
    table: &Table,
    column: &str,
    allowed: &HashSet<String>,
    normalize: bool,
    severity: Severity,
) -> Vec<Finding> {
    column_rule(table, rule::DOMAIN, column, severity, |col| {
        any_value(col.values(), |v| {
            v.as_text()
                .map(|s| if normalize { s.trim().to_uppercase() } else { s })
                .is_none_or(|s| !allowed.contains(&s))
        })
        .then(|| QualityIssue::OutOfDomain {
            column: column.to_string(),
        })
    })
}

fn not_future(table: &Table, column: &str, today: NaiveDate, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::NOT_FUTURE, column, severity, |col| {
        any_value(col.values(), |v| v.as_date().is_some_and(|d| d > today)).then(|| {
            QualityIssue::FutureDates {
                column: column.to_string(),
                today,
            }
        })
    })
}

fn date_range(
    table: &Table,
    column: &str,
    min: NaiveDate,
    max: NaiveDate,
    severity: Severity,
) -> Vec<Finding> {
    column_rule(table, rule::DATE_RANGE, column, severity, |col| {
        any_value(col.values(), |v| v.as_date().is_some_and(|d| d < min || d > max)).then(|| {
            QualityIssue::DatesOutOfRange {
                column: column.to_string(),
                min,
                max,
            }
        })
    })
}

fn not_null(table: &Table, column: &str, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::NOT_NULL, column, severity, |col| {
        any_value(col.values(), |v| v.as_text().is_none()).then(|| QualityIssue::NullValues {
            column: column.to_string(),
        })
    })
}

fn unique(table: &Table, column: &str, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::UNIQUE, column, severity, |col| {
        let mut seen = HashSet::new();
        let duplicated = col
            .values()
            .iter()
            .filter_map(Value::as_text)
            .any(|key| !seen.insert(key));
        duplicated.then(|| QualityIssue::DuplicateValues {
            column: column.to_string(),
        })
    })
}

fn pattern(table: &Table, column: &str, regex: &Regex, severity: Severity) -> Vec<Finding> {
    column_rule(table, rule::PATTERN, column, severity, |col| {
        any_value(col.values(), |v| v.as_text().is_some_and(|s| !regex.is_match(&s))).then(|| {
            QualityIssue::PatternMismatch {
                column: column.to_string(),
                pattern: regex.as_str().to_string(),
            }
        })
    })
}

fn any_value<F: Fn(&Value) -> bool>(values: &[Value], predicate: F) -> bool {
    values.iter().any(predicate)
}

// --- CHECKER ---

#[derive(Debug, Clone)]
enum CompiledRule {
    NonNegative { column: String },
    MinValue { column: String, min: f64 },
    MaxValue { column: String, max: f64 },
    Domain {
        column: String,
        allowed: HashSet<String>,
        normalize: bool,
    },
    NotFuture { column: String },
    DateRange { column: String, min: NaiveDate, max: NaiveDate },
    NotNull { column: String },
    Unique { column: String },
    Pattern { column: String, regex: Regex },
}

#[derive(Debug, Clone, Default)]
pub struct SemanticChecker {
    rules: Vec<(CompiledRule, Severity)>,
}

impl SemanticChecker {
    pub fn new(rules: &[SemanticRule]) -> Result<Self, DomainError> {
        let compiled = rules
            .iter()
            .map(|r| Ok((compile(&r.check)?, r.severity)))
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(Self { rules: compiled })
    }
}

fn compile(check: &SemanticCheck) -> Result<CompiledRule, DomainError> {
    let column = check.column().to_string();
    Ok(match check {
        SemanticCheck::NonNegative { .. } => CompiledRule::NonNegative { column },
        SemanticCheck::MinValue { min, .. } => CompiledRule::MinValue { column, min: *min },
        SemanticCheck::MaxValue { max, .. } => CompiledRule::MaxValue { column, max: *max },
        SemanticCheck::Domain {
            allowed, normalize, ..
        } => CompiledRule::Domain {
            column,
            allowed: allowed
                .iter()
                .map(|a| if *normalize { a.trim().to_uppercase() } else { a.clone() })
                .collect(),
            normalize: *normalize,
        },
        SemanticCheck::NotFuture { .. } => CompiledRule::NotFuture { column },
        SemanticCheck::DateRange { min, max, .. } => CompiledRule::DateRange {
            column,
            min: *min,
            max: *max,
        },
        SemanticCheck::NotNull { .. } => CompiledRule::NotNull { column },
        SemanticCheck::Unique { .. } => CompiledRule::Unique { column },
        SemanticCheck::Pattern { pattern, .. } => CompiledRule::Pattern {
            regex: Regex::new(pattern).map_err(|e| {
                DomainError::InvalidRuleSet(format!("Invalid pattern for '{}': {}", column, e))
            })?,
            column,
        },
    })
}

impl Checker for SemanticChecker {
    fn name(&self) -> &str {
        "semantic"
    }

    fn tier(&self) -> CheckerTier {
        CheckerTier::Semantic
    }

    fn check(&self, table: &Table, ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError> {
        let mut findings = Vec::new();
        for (rule, severity) in &self.rules {
            let severity = *severity;
            let found = match rule {
                CompiledRule::NonNegative { column } => non_negative(table, column, severity),
                CompiledRule::MinValue { column, min } => min_value(table, column, *min, severity),
                CompiledRule::MaxValue { column, max } => max_value(table, column, *max, severity),
                CompiledRule::Domain {
                    column,
                    allowed,
                    normalize,
                } => domain(table, column, allowed, *normalize, severity),
                CompiledRule::NotFuture { column } => not_future(table, column, ctx.today, severity),
                CompiledRule::DateRange { column, min, max } => {
                    date_range(table, column, *min, *max, severity)
                }
                CompiledRule::NotNull { column } => not_null(table, column, severity),
                CompiledRule::Unique { column } => unique(table, column, severity),
                CompiledRule::Pattern { column, regex } => pattern(table, column, regex, severity),
            };
            findings.extend(found);
        }
        Ok(findings)
    }
}
