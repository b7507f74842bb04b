// tollgate-core/src/domain/quality/rule.rs
//
// A rule is a pure function (table, column?, params) -> Vec<Finding>.
// Rules never mutate the table. When the referenced column is absent a rule
// returns exactly one structural finding and stops there.

use crate::domain::quality::finding::{Finding, QualityIssue, Severity};
use crate::domain::table::{Column, Table};

pub const REQUIRED_COLUMN: &str = "syntactic.required_column";
pub const COLUMN_TYPE: &str = "syntactic.column_type";
pub const NON_NEGATIVE: &str = "semantic.non_negative";
pub const MIN_VALUE: &str = "semantic.min_value";
pub const MAX_VALUE: &str = "semantic.max_value";
pub const DOMAIN: &str = "semantic.domain";
pub const NOT_FUTURE: &str = "semantic.not_future";
pub const DATE_RANGE: &str = "semantic.date_range";
pub const NOT_NULL: &str = "semantic.not_null";
pub const UNIQUE: &str = "semantic.unique";
pub const PATTERN: &str = "semantic.pattern";
pub const ROW_COUNT: &str = "statistical.row_count";
pub const CHECKER_FAILURE: &str = "orchestrator.checker_failure";

/// Resolves `column` or produces the structural finding the rule must return instead.
pub fn require_column<'t>(
    table: &'t Table,
    rule_id: &str,
    column: &str,
) -> Result<&'t Column, Finding> {
    table.column(column).ok_or_else(|| {
        Finding::new(
            rule_id,
            Severity::Error,
            &QualityIssue::MissingColumn {
                column: column.to_string(),
            },
        )
    })
}

/// Runs `check` against the column when present. A violated check yields a single
/// column-level finding.
pub fn column_rule<F>(
    table: &Table,
    rule_id: &str,
    column: &str,
    severity: Severity,
    check: F,
) -> Vec<Finding>
where
    F: FnOnce(&Column) -> Option<QualityIssue>,
{
    match require_column(table, rule_id, column) {
        Ok(col) => check(col)
            .map(|issue| vec![Finding::new(rule_id, severity, &issue)])
            .unwrap_or_default(),
        Err(missing) => vec![missing],
    }
}
