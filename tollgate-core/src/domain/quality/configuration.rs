// tollgate-core/src/domain/quality/configuration.rs

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;
use crate::domain::quality::semantic::{SemanticCheck, SemanticRule};
use crate::domain::quality::statistical::StatisticalConfig;
use crate::domain::quality::syntactic::TypeExpectation;

/// Caller-supplied rule configuration for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RuleSet {
    #[serde(default)]
    #[validate(custom(function = "validate_column_names"))]
    pub required_columns: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    #[validate(custom(function = "validate_unique_type_columns"))]
    pub expected_types: Vec<TypeExpectation>,

    #[serde(default)]
    #[validate(custom(function = "validate_semantic_rules"))]
    pub semantic: Vec<SemanticRule>,

    #[serde(default)]
    #[validate(nested)]
    pub statistical: StatisticalConfig,
}

impl RuleSet {
    /// Fails on the first malformed section. Must pass before any checker runs.
    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidRuleSet(e.to_string()))
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::from(message))
}

fn validate_column_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(invalid(
            "empty_column",
            "Column names cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_unique_type_columns(expected: &[TypeExpectation]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for e in expected {
        if !seen.insert(e.column.as_str()) {
            return Err(invalid(
                "duplicate_type_expectation",
                format!("Column '{}' has more than one expected type", e.column),
            ));
        }
    }
    Ok(())
}

fn validate_semantic_rules(rules: &[SemanticRule]) -> Result<(), ValidationError> {
    for rule in rules {
        if rule.check.column().trim().is_empty() {
            return Err(invalid(
                "empty_column",
                "Semantic rule without a column".to_string(),
            ));
        }
        match &rule.check {
            SemanticCheck::Domain { column, allowed, .. } if allowed.is_empty() => {
                return Err(invalid(
                    "empty_domain",
                    format!("Domain check on '{}' has no allowed values", column),
                ));
            }
            SemanticCheck::DateRange { column, min, max } if min > max => {
                return Err(invalid(
                    "date_range",
                    format!("Date range on '{}' has min {} after max {}", column, min, max),
                ));
            }
            SemanticCheck::MinValue { column, min } if !min.is_finite() => {
                return Err(invalid(
                    "min_value",
                    format!("Min value on '{}' must be a finite number", column),
                ));
            }
            SemanticCheck::MaxValue { column, max } if !max.is_finite() || *max < 0.0 => {
                return Err(invalid(
                    "max_value",
                    format!("Max value on '{}' must be a non-negative number", column),
                ));
            }
            SemanticCheck::Pattern { column, pattern } => {
                regex::Regex::new(pattern).map_err(|e| {
                    invalid(
                        "pattern",
                        format!("Invalid pattern for '{}': {}", column, e),
                    )
                })?;
            }
            _ => {}
        }
    }
    Ok(())
}
