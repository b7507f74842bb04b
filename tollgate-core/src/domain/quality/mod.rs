// tollgate-core/src/domain/quality/mod.rs

pub mod checker;
pub mod configuration;
pub mod finding;
pub mod rule;
pub mod semantic;
pub mod statistical;
pub mod syntactic;

// Re-exports
pub use checker::{CheckContext, Checker, CheckerError, CheckerTier};
pub use configuration::RuleSet;
pub use finding::{Finding, FindingKind, QualityIssue, Severity};
pub use semantic::{
    SemanticCheck, SemanticChecker, SemanticRule, check_domain, check_non_negative,
    check_not_future,
};
pub use statistical::{
    DEFAULT_IQR_K, IqrBounds, RowCountBounds, StatisticalChecker, StatisticalConfig,
    check_row_count, iqr_outlier_mask,
};
pub use syntactic::{
    SyntacticChecker, TypeExpectation, TypeMatchMode, check_column_types, check_required_columns,
};
