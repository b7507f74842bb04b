// tollgate-core/src/domain/quality/syntactic.rs
//
// Shape checks: required columns and column types. Nothing here looks at business meaning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::domain::quality::checker::{CheckContext, Checker, CheckerError, CheckerTier};
use crate::domain::quality::finding::{Finding, QualityIssue, Severity};
use crate::domain::quality::rule::{self, require_column};
use crate::domain::table::{Column, ColumnType, SemanticType, Table};

/// How a column's type is compared against the declared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeMatchMode {
    /// The column's realized type tag must equal the expected type.
    #[default]
    Exact,
    /// Every non-null value must be of the expected type. All-null columns pass.
    Elementwise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TypeExpectation {
    #[validate(length(min = 1, message = "Column name cannot be empty"))]
    pub column: String,
    #[serde(rename = "type")]
    pub expected: SemanticType,
    #[serde(default)]
    pub mode: TypeMatchMode,
}

impl TypeExpectation {
    pub fn exact(column: impl Into<String>, expected: SemanticType) -> Self {
        Self {
            column: column.into(),
            expected,
            mode: TypeMatchMode::Exact,
        }
    }

    pub fn elementwise(column: impl Into<String>, expected: SemanticType) -> Self {
        Self {
            column: column.into(),
            expected,
            mode: TypeMatchMode::Elementwise,
        }
    }
}

/// One finding per missing name, in lexicographic order.
pub fn check_required_columns<S: AsRef<str>>(table: &Table, expected: &[S]) -> Vec<Finding> {
    let missing: BTreeSet<&str> = expected
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !table.has_column(name))
        .collect();

    missing
        .into_iter()
        .map(|column| {
            Finding::new(
                rule::REQUIRED_COLUMN,
                Severity::Error,
                &QualityIssue::MissingColumn {
                    column: column.to_string(),
                },
            )
        })
        .collect()
}

/// Compares each expected column's type. Mismatches are recorded, never corrected.
pub fn check_column_types(table: &Table, expected: &[TypeExpectation]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for expectation in expected {
        match require_column(table, rule::COLUMN_TYPE, &expectation.column) {
            Ok(column) => {
                if let Some(issue) = type_mismatch(column, expectation) {
                    findings.push(Finding::new(rule::COLUMN_TYPE, Severity::Error, &issue));
                }
            }
            Err(missing) => findings.push(missing),
        }
    }
    findings
}

fn type_mismatch(column: &Column, expectation: &TypeExpectation) -> Option<QualityIssue> {
    let observed = match expectation.mode {
        TypeMatchMode::Exact => {
            let dtype = column.dtype();
            (dtype != ColumnType::Declared(expectation.expected)).then(|| dtype.to_string())?
        }
        TypeMatchMode::Elementwise => {
            let mut offending: Vec<SemanticType> = Vec::new();
            for ty in column.values().iter().filter_map(|v| v.semantic_type()) {
                if ty != expectation.expected && !offending.contains(&ty) {
                    offending.push(ty);
                }
            }
            if offending.is_empty() {
                return None;
            }
            offending
                .iter()
                .map(SemanticType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    Some(QualityIssue::TypeMismatch {
        column: column.name().to_string(),
        observed,
        expected: expectation.expected.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct SyntacticChecker {
    required_columns: Vec<String>,
    expected_types: Vec<TypeExpectation>,
}

impl SyntacticChecker {
    pub fn new(required_columns: Vec<String>, expected_types: Vec<TypeExpectation>) -> Self {
        Self {
            required_columns,
            expected_types,
        }
    }
}

impl Checker for SyntacticChecker {
    fn name(&self) -> &str {
        "syntactic"
    }

    fn tier(&self) -> CheckerTier {
        CheckerTier::Syntactic
    }

    fn check(&self, table: &Table, _ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError> {
        let mut findings = check_required_columns(table, &self.required_columns);
        findings.extend(check_column_types(table, &self.expected_types));
        Ok(findings)
    }
}
