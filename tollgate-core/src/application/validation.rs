// tollgate-core/src/application/validation.rs

use serde::Serialize;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, instrument, warn};

use crate::domain::error::DomainError;
use crate::domain::ports::ReportSink;
use crate::domain::quality::rule::CHECKER_FAILURE;
use crate::domain::quality::{
    CheckContext, Checker, Finding, FindingKind, QualityIssue, RuleSet,
    SemanticChecker, Severity, StatisticalChecker, SyntacticChecker,
};
use crate::domain::table::Table;

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    /// No finding of `Error` severity.
    pub passed: bool,
}

impl ValidationReport {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let passed = !findings.iter().any(|f| f.severity() == Severity::Error);
        Self { findings, passed }
    }

    pub fn count_by_kind(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind() == kind).count()
    }
}

/// Runs checkers tier by tier and accumulates their findings. Never fails on data.
pub struct Validator {
    checkers: Vec<Box<dyn Checker>>,
}

impl Validator {
    /// The three built-in checkers configured from `rules`. A malformed rule set is fatal here,
    /// before anything runs.
    pub fn from_rules(rules: &RuleSet) -> Result<Self, DomainError> {
        rules.ensure_valid()?;
        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(SyntacticChecker::new(
                rules.required_columns.clone(),
                rules.expected_types.clone(),
            )),
            Box::new(SemanticChecker::new(&rules.semantic)?),
            Box::new(StatisticalChecker::new(rules.statistical.clone())),
        ];
        Ok(Self { checkers })
    }

    pub fn empty() -> Self {
        Self {
            checkers: Vec::new(),
        }
    }

    /// Registers an extra checker after those already in its tier.
    pub fn with_checker(mut self, checker: Box<dyn Checker>) -> Self {
        self.checkers.push(checker);
        // Stable: registration order holds inside a tier.
        self.checkers.sort_by_key(|c| c.tier());
        self
    }

    pub fn checker_names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    pub fn run(&self, table: &Table, sink: &mut dyn ReportSink) -> ValidationReport {
        self.run_at(table, &CheckContext::now(), sink)
    }

    #[instrument(skip_all, fields(rows = table.row_count(), checkers = self.checkers.len()))]
    pub fn run_at(
        &self,
        table: &Table,
        ctx: &CheckContext,
        sink: &mut dyn ReportSink,
    ) -> ValidationReport {
        let mut findings = Vec::new();
        let mut reported_missing: HashSet<String> = HashSet::new();

        for checker in &self.checkers {
            let produced = run_isolated(checker.as_ref(), table, ctx);
            debug!(checker = checker.name(), findings = produced.len(), "Checker done");

            for finding in produced {
                // One structural finding per missing column, whichever rule saw it first.
                if finding.is_structural() {
                    if let Some(column) = finding.column() {
                        if !reported_missing.insert(column.to_string()) {
                            continue;
                        }
                    }
                }
                sink.on_finding(&finding);
                findings.push(finding);
            }
        }

        ValidationReport::from_findings(findings)
    }
}

/// Converts a checker fault (error or panic) into a single diagnostic finding.
fn run_isolated(checker: &dyn Checker, table: &Table, ctx: &CheckContext) -> Vec<Finding> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| checker.check(table, ctx)));
    let reason = match outcome {
        Ok(Ok(findings)) => return findings,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panicked".to_string()),
    };

    warn!(checker = checker.name(), tier = %checker.tier(), %reason, "Checker failed");
    vec![Finding::new(
        CHECKER_FAILURE,
        Severity::Error,
        &QualityIssue::CheckerFailure {
            checker: checker.name().to_string(),
            reason,
        },
    )]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::ports::MemorySink;
    use crate::domain::quality::{
        CheckerError, CheckerTier, RowCountBounds, SemanticCheck, StatisticalConfig,
        TypeExpectation,
    };
    use crate::domain::routing::{DuplicateIds, Router, RoutingPolicy};
    use crate::domain::table::{SemanticType, Value};
    use chrono::NaiveDate;

    struct FailingChecker;

    impl Checker for FailingChecker {
        fn name(&self) -> &str {
            "failing"
        }

        fn tier(&self) -> CheckerTier {
            CheckerTier::Semantic
        }

        fn check(&self, _table: &Table, _ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError> {
            Err(CheckerError::UnexpectedInput("boom".into()))
        }
    }

    struct PanickingChecker;

    impl Checker for PanickingChecker {
        fn name(&self) -> &str {
            "panicking"
        }

        fn tier(&self) -> CheckerTier {
            CheckerTier::Syntactic
        }

        fn check(&self, _table: &Table, _ctx: &CheckContext) -> Result<Vec<Finding>, CheckerError> {
            panic!("index out of range")
        }
    }

    fn ctx() -> CheckContext {
        CheckContext::new(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap())
    }

    fn rules() -> RuleSet {
        RuleSet {
            required_columns: vec!["id".into(), "date".into(), "amount".into(), "currency".into()],
            expected_types: vec![TypeExpectation::exact("amount", SemanticType::Float)],
            semantic: vec![
                SemanticCheck::NonNegative {
                    column: "amount".into(),
                }
                .into(),
                SemanticCheck::Domain {
                    column: "currency".into(),
                    allowed: vec!["ARS".into(), "USD".into()],
                    normalize: false,
                }
                .into(),
                SemanticCheck::NotFuture {
                    column: "date".into(),
                }
                .into(),
            ],
            statistical: StatisticalConfig {
                row_count: Some(RowCountBounds { min: 1, max: 100 }),
            },
        }
    }

    fn batch() -> Table {
        Table::from_rows(
            &["id", "date", "amount", "currency"],
            vec![
                vec![Value::Integer(1), "2025-07-01".into(), Value::Float(-5.0), "ARS".into()],
                vec![Value::Integer(2), "2099-01-01".into(), Value::Float(-7.0), "XXX".into()],
                vec![Value::Integer(3), "bad".into(), Value::Float(20.0), "USD".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_findings_follow_tier_order() -> anyhow::Result<()> {
        let validator = Validator::from_rules(&rules())?;
        let mut sink = MemorySink::default();
        let report = validator.run_at(&batch(), &ctx(), &mut sink);

        let ids: Vec<_> = report.findings.iter().map(|f| f.rule_id()).collect();
        assert_eq!(
            ids,
            vec!["semantic.non_negative", "semantic.domain", "semantic.not_future"]
        );
        assert!(!report.passed);
        assert_eq!(report.count_by_kind(FindingKind::BusinessRule), 3);
        assert_eq!(sink.findings, report.findings);
        Ok(())
    }

    #[test]
    fn test_missing_column_isolation() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &["id", "date", "currency"],
            vec![vec![Value::Integer(1), "2025-07-01".into(), "ARS".into()]],
        )?;
        let report = Validator::from_rules(&rules())?.run_at(&table, &ctx(), &mut MemorySink::default());

        let about_amount: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.column() == Some("amount"))
            .collect();
        assert_eq!(about_amount.len(), 1);
        assert_eq!(about_amount[0].kind(), FindingKind::Structural);
        assert_eq!(about_amount[0].message(), "Missing expected column: amount");
        Ok(())
    }

    #[test]
    fn test_checker_failure_is_isolated() -> anyhow::Result<()> {
        let validator = Validator::from_rules(&rules())?
            .with_checker(Box::new(FailingChecker))
            .with_checker(Box::new(PanickingChecker));
        assert_eq!(
            validator.checker_names(),
            vec!["syntactic", "panicking", "semantic", "failing", "statistical"]
        );

        let report = validator.run_at(&batch(), &ctx(), &mut MemorySink::default());
        let failures: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.kind() == FindingKind::CheckerFailure)
            .collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].message(), "Checker 'panicking' failed: index out of range");
        assert_eq!(
            failures[1].message(),
            "Checker 'failing' failed: unexpected input shape: boom"
        );
        // The rest of the report survives.
        assert_eq!(report.count_by_kind(FindingKind::BusinessRule), 3);
        Ok(())
    }

    #[test]
    fn test_clean_batch_passes_and_is_deterministic() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &["id", "date", "amount", "currency"],
            vec![vec![Value::Integer(1), "2025-07-01".into(), Value::Float(5.0), "USD".into()]],
        )?;
        let validator = Validator::from_rules(&rules())?;
        let a = validator.run_at(&table, &ctx(), &mut MemorySink::default());
        let b = validator.run_at(&table, &ctx(), &mut MemorySink::default());
        assert!(a.passed);
        assert!(a.findings.is_empty());
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_validator_and_router_agree_on_currency_case() -> anyhow::Result<()> {
        let today = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let table = Table::from_rows(
            &["id", "party_id", "item_id", "date", "amount", "currency"],
            vec![vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                "2025-07-01".into(),
                Value::Float(5.0),
                "usd".into(),
            ]],
        )?;
        let route = |policy: RoutingPolicy| -> anyhow::Result<usize> {
            let outcome = Router::new(policy)?.route(&table, today, &mut MemorySink::default())?;
            Ok(outcome.quarantine.row_count())
        };

        // Exact comparison on both sides by default.
        let report = Validator::from_rules(&rules())?.run_at(&table, &ctx(), &mut MemorySink::default());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].rule_id(), "semantic.domain");
        assert_eq!(route(RoutingPolicy::new(DuplicateIds::Keep))?, 1);

        let mut normalized = rules();
        normalized.semantic[1] = SemanticCheck::Domain {
            column: "currency".into(),
            allowed: vec!["ars".into(), "USD".into()],
            normalize: true,
        }
        .into();
        let report = Validator::from_rules(&normalized)?.run_at(&table, &ctx(), &mut MemorySink::default());
        assert!(report.findings.is_empty());
        let mut policy = RoutingPolicy::new(DuplicateIds::Keep);
        policy.normalize_currency = true;
        assert_eq!(route(policy)?, 0);
        Ok(())
    }

    #[test]
    fn test_empty_table_row_count_anomaly() -> anyhow::Result<()> {
        let table = Table::from_rows(&["id", "date", "amount", "currency"], vec![])?;
        let report = Validator::from_rules(&rules())?.run_at(&table, &ctx(), &mut MemorySink::default());
        assert_eq!(report.count_by_kind(FindingKind::StatisticalAnomaly), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_rules_abort_before_running() {
        let mut bad = rules();
        bad.statistical.row_count = Some(RowCountBounds { min: 10, max: 1 });
        assert!(matches!(
            Validator::from_rules(&bad),
            Err(DomainError::InvalidRuleSet(_))
        ));
    }
}
