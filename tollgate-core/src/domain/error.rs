// tollgate-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid rule set: {0}")]
    #[diagnostic(
        code(tollgate::domain::rule_set),
        help("Fix the rule configuration; no checker runs until it is valid.")
    )]
    InvalidRuleSet(String),

    #[error("Invalid routing policy: {0}")]
    #[diagnostic(code(tollgate::domain::routing_policy))]
    InvalidRoutingPolicy(String),

    #[error("Invalid aggregate view '{view}': {reason}")]
    #[diagnostic(code(tollgate::domain::gold))]
    InvalidView { view: String, reason: String },

    #[error("Schema Error: {0}")]
    #[diagnostic(code(tollgate::domain::schema))]
    SchemaError(String),
}
