// tollgate-core/src/domain/quality/checker.rs

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::quality::finding::Finding;
use crate::domain::table::Table;

/// Fixed execution order of checkers: syntactic, then semantic, then statistical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerTier {
    Syntactic,
    Semantic,
    Statistical,
}

impl fmt::Display for CheckerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Syntactic => "syntactic",
            Self::Semantic => "semantic",
            Self::Statistical => "statistical",
        };
        write!(f, "{}", s)
    }
}

/// Internal fault of a checker. Never a data-quality problem.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("unexpected input shape: {0}")]
    UnexpectedInput(String),
}

/// Evaluation context shared by every checker of one run.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext {
    /// "Today" at validation time, normalized to a calendar date.
    pub today: NaiveDate,
}

impl CheckContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn now() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

pub trait Checker: Send + Sync {
    fn name(&self) -> &str;

    fn tier(&self) -> CheckerTier;

    /// Findings in rule registration order. `Err` only for internal faults.
    fn check(&self, table: &Table, ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError>;
}
