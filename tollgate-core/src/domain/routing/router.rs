// tollgate-core/src/domain/routing/router.rs

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::ports::ReportSink;
use crate::domain::quality::statistical::iqr_outlier_mask;
use crate::domain::routing::policy::{DuplicateIds, RoutingPolicy};
use crate::domain::table::{Column, SemanticType, Table, Value};

/// Why a row was quarantined. A row may carry several; it is still routed once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    MissingField { column: String },
    FutureDate { date: NaiveDate },
    NegativeAmount { amount: f64 },
    AboveCeiling { amount: f64, ceiling: f64 },
    CurrencyOutOfDomain { currency: String },
    AmountOutlier { amount: f64 },
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::FutureDate { .. } => "future_date",
            Self::NegativeAmount { .. } => "negative_amount",
            Self::AboveCeiling { .. } => "above_ceiling",
            Self::CurrencyOutOfDomain { .. } => "currency_out_of_domain",
            Self::AmountOutlier { .. } => "amount_outlier",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { column } => write!(f, "missing or unparseable '{}'", column),
            Self::FutureDate { date } => write!(f, "future date {}", date),
            Self::NegativeAmount { amount } => write!(f, "negative amount {}", amount),
            Self::AboveCeiling { amount, ceiling } => {
                write!(f, "amount {} above ceiling {}", amount, ceiling)
            }
            Self::CurrencyOutOfDomain { currency } => write!(f, "currency '{}' not allowed", currency),
            Self::AmountOutlier { amount } => write!(f, "amount {} outside IQR fences", amount),
        }
    }
}

/// Row counts of one routing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct RoutingSummary {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub clean_rows: usize,
    pub quarantine_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingOutcome {
    pub clean: Table,
    pub quarantine: Table,
    /// `reasons[i]` explains quarantine row `i`.
    pub reasons: Vec<Vec<RejectReason>>,
    pub duplicates_removed: usize,
}

impl RoutingOutcome {
    pub fn summary(&self) -> RoutingSummary {
        RoutingSummary {
            input_rows: self.clean.row_count()
                + self.quarantine.row_count()
                + self.duplicates_removed,
            duplicates_removed: self.duplicates_removed,
            clean_rows: self.clean.row_count(),
            quarantine_rows: self.quarantine.row_count(),
        }
    }
}

/// Per-row classifier splitting a batch into clean and quarantine tiers.
#[derive(Debug, Clone)]
pub struct Router {
    policy: RoutingPolicy,
    /// Allowed codes in the form normalized cells take.
    allowed: HashSet<String>,
}

impl Router {
    pub fn new(policy: RoutingPolicy) -> Result<Self, DomainError> {
        policy.ensure_valid()?;
        let allowed = policy
            .allowed_currencies
            .iter()
            .map(|a| {
                if policy.normalize_currency {
                    a.trim().to_uppercase()
                } else {
                    a.clone()
                }
            })
            .collect();
        Ok(Self { policy, allowed })
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Partitions `table`. Row data never causes an error: bad rows go to quarantine.
    #[instrument(skip_all, fields(rows = table.row_count()))]
    pub fn route(
        &self,
        table: &Table,
        today: NaiveDate,
        sink: &mut dyn ReportSink,
    ) -> Result<RoutingOutcome, DomainError> {
        let (kept, duplicates_removed) = self.dedup_indices(table);
        let normalized = if duplicates_removed > 0 {
            self.normalize(&table.select_rows(&kept))?
        } else {
            self.normalize(table)?
        };
        let verdicts = self.classify(&normalized, today);

        let mut clean_idx = Vec::new();
        let mut quarantine_idx = Vec::new();
        let mut reasons = Vec::new();
        for (i, row_reasons) in verdicts.into_iter().enumerate() {
            if row_reasons.is_empty() {
                clean_idx.push(i);
            } else {
                quarantine_idx.push(i);
                reasons.push(row_reasons);
            }
        }

        let outcome = RoutingOutcome {
            clean: normalized.select_rows(&clean_idx),
            quarantine: normalized.select_rows(&quarantine_idx),
            reasons,
            duplicates_removed,
        };

        let summary = outcome.summary();
        debug!(
            clean = summary.clean_rows,
            quarantine = summary.quarantine_rows,
            duplicates = summary.duplicates_removed,
            "Routing complete"
        );
        sink.on_routed(&summary);
        Ok(outcome)
    }

    /// Row indices surviving deduplication, plus how many were dropped.
    /// Rows whose id is missing are never treated as duplicates.
    fn dedup_indices(&self, table: &Table) -> (Vec<usize>, usize) {
        let all: Vec<usize> = (0..table.row_count()).collect();
        if self.policy.duplicate_ids == DuplicateIds::Keep {
            return (all, 0);
        }
        let Some(ids) = table.column(&self.policy.fields.id) else {
            return (all, 0);
        };

        let mut seen = HashSet::new();
        let kept: Vec<usize> = all
            .into_iter()
            .filter(|&i| match ids.values()[i].as_i64() {
                Some(id) => seen.insert(id),
                None => true,
            })
            .collect();
        let removed = table.row_count() - kept.len();
        (kept, removed)
    }

    /// Coerces the required columns and puts them first in canonical order.
    /// Absent required columns are added as all-null columns.
    fn normalize(&self, table: &Table) -> Result<Table, DomainError> {
        let fields = &self.policy.fields;
        let targets = [
            (fields.id.as_str(), SemanticType::Integer),
            (fields.party_id.as_str(), SemanticType::Integer),
            (fields.item_id.as_str(), SemanticType::Integer),
            (fields.date.as_str(), SemanticType::Temporal),
            (fields.amount.as_str(), SemanticType::Float),
            (fields.currency.as_str(), SemanticType::Text),
        ];

        let mut columns: Vec<Column> = targets
            .iter()
            .map(|&(name, target)| match table.column(name) {
                Some(col) if name == fields.currency => self.normalize_currency(col),
                Some(col) => col.coerced(target),
                None => Column::with_type(name, target, vec![Value::Null; table.row_count()]),
            })
            .collect();

        let canonical = fields.canonical();
        columns.extend(
            table
                .columns()
                .iter()
                .filter(|c| !canonical.contains(&c.name()))
                .cloned(),
        );
        Table::new(columns)
    }

    fn normalize_currency(&self, column: &Column) -> Column {
        let text = column.coerced(SemanticType::Text);
        if !self.policy.normalize_currency {
            return text;
        }
        let values = text
            .values()
            .iter()
            .map(|v| match v {
                Value::Text(s) => Value::Text(s.to_uppercase()),
                other => other.clone(),
            })
            .collect();
        Column::with_type(column.name(), SemanticType::Text, values)
    }

    fn classify(&self, table: &Table, today: NaiveDate) -> Vec<Vec<RejectReason>> {
        let fields = &self.policy.fields;
        let amounts: Vec<Option<f64>> = table
            .column(&fields.amount)
            .map(|c| c.values().iter().map(Value::as_f64).collect())
            .unwrap_or_else(|| vec![None; table.row_count()]);
        let outliers = match self.policy.iqr_k {
            Some(k) => iqr_outlier_mask(&amounts, k),
            None => vec![false; table.row_count()],
        };

        (0..table.row_count())
            .map(|i| {
                let mut reasons = Vec::new();
                for name in fields.canonical() {
                    let missing = table.column(name).map_or(true, |c| c.values()[i].is_null());
                    if missing {
                        reasons.push(RejectReason::MissingField {
                            column: name.to_string(),
                        });
                    }
                }

                if let Some(date) = table.column(&fields.date).and_then(|c| c.values()[i].as_date()) {
                    if date > today {
                        reasons.push(RejectReason::FutureDate { date });
                    }
                }

                if let Some(amount) = amounts[i] {
                    if amount < 0.0 {
                        reasons.push(RejectReason::NegativeAmount { amount });
                    }
                    if amount > self.policy.amount_ceiling {
                        reasons.push(RejectReason::AboveCeiling {
                            amount,
                            ceiling: self.policy.amount_ceiling,
                        });
                    }
                    if outliers[i] {
                        reasons.push(RejectReason::AmountOutlier { amount });
                    }
                }

                if let Some(Value::Text(currency)) =
                    table.column(&fields.currency).map(|c| &c.values()[i])
                {
                    if !self.allowed.contains(currency) {
                        reasons.push(RejectReason::CurrencyOutOfDomain {
                            currency: currency.clone(),
                        });
                    }
                }

                reasons
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::ports::MemorySink;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()
    }

    fn router(dedup: DuplicateIds) -> Router {
        let mut policy = RoutingPolicy::new(dedup);
        policy.amount_ceiling = 100_000.0;
        policy.normalize_currency = true;
        Router::new(policy).unwrap()
    }

    fn row(id: i64, date: &str, amount: f64, currency: &str) -> Vec<Value> {
        vec![
            Value::Integer(id),
            Value::Integer(10),
            Value::Integer(20),
            Value::from(date),
            Value::Float(amount),
            Value::from(currency),
        ]
    }

    const NAMES: [&str; 6] = ["id", "party_id", "item_id", "date", "amount", "currency"];

    #[test]
    fn test_future_and_ceiling_row_counted_once() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &NAMES,
            vec![
                row(1, "2025-07-01", 150.0, "ARS"),
                row(3, "2099-01-01", 999_999.9, "ARS"),
            ],
        )?;
        let mut sink = MemorySink::default();
        let outcome = router(DuplicateIds::Keep).route(&table, today(), &mut sink)?;

        assert_eq!(outcome.clean.row_count(), 1);
        assert_eq!(outcome.quarantine.row_count(), 1);
        assert_eq!(outcome.quarantine.column("id").unwrap().values()[0], Value::Integer(3));
        assert_eq!(outcome.reasons[0].len(), 2);
        assert!(matches!(outcome.reasons[0][0], RejectReason::FutureDate { .. }));
        assert!(matches!(outcome.reasons[0][1], RejectReason::AboveCeiling { .. }));
        assert_eq!(sink.routed.len(), 1);
        assert_eq!(sink.routed[0].input_rows, 2);
        Ok(())
    }

    #[test]
    fn test_partition_is_total_and_disjoint() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &NAMES,
            vec![
                row(1, "2025-07-01", 150.0, "ARS"),
                row(2, "garbage", 10.0, "USD"),
                row(3, "2025-07-02", -5.0, "USD"),
                row(4, "2025-07-03", 20.0, "XXX"),
                row(5, "2025-07-04", 30.0, " usd "),
            ],
        )?;
        let outcome = router(DuplicateIds::Keep).route(&table, today(), &mut MemorySink::default())?;

        assert_eq!(
            outcome.clean.row_count() + outcome.quarantine.row_count(),
            table.row_count()
        );
        let ids = |t: &Table| -> Vec<i64> {
            t.column("id").unwrap().values().iter().filter_map(Value::as_i64).collect()
        };
        assert_eq!(ids(&outcome.clean), vec![1, 5]);
        assert_eq!(ids(&outcome.quarantine), vec![2, 3, 4]);
        assert_eq!(
            outcome.clean.column("currency").unwrap().values()[1],
            Value::from("USD")
        );
        assert_eq!(
            outcome.reasons[2],
            vec![RejectReason::CurrencyOutOfDomain {
                currency: "XXX".into()
            }]
        );
        Ok(())
    }

    #[test]
    fn test_currency_case_is_exact_unless_normalized() -> anyhow::Result<()> {
        let table = Table::from_rows(&NAMES, vec![row(1, "2025-07-01", 10.0, "usd")])?;

        let exact = Router::new(RoutingPolicy::new(DuplicateIds::Keep))?;
        let outcome = exact.route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(outcome.quarantine.row_count(), 1);

        let mut policy = RoutingPolicy::new(DuplicateIds::Keep);
        policy.normalize_currency = true;
        policy.allowed_currencies = vec!["ars".into(), "usd".into()];
        let outcome = Router::new(policy)?.route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(outcome.clean.row_count(), 1);
        assert_eq!(
            outcome.clean.column("currency").unwrap().values()[0],
            Value::from("USD")
        );
        Ok(())
    }

    #[test]
    fn test_canonical_column_order_and_missing_column() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &["note", "amount", "id", "currency", "date", "party_id"],
            vec![vec![
                Value::from("x"),
                Value::from("12.5"),
                Value::Integer(1),
                Value::from("ARS"),
                Value::from("2025-01-01"),
                Value::Integer(2),
            ]],
        )?;
        let outcome = router(DuplicateIds::Keep).route(&table, today(), &mut MemorySink::default())?;

        let expected = vec!["id", "party_id", "item_id", "date", "amount", "currency", "note"];
        assert_eq!(outcome.clean.column_names(), expected);
        assert_eq!(outcome.quarantine.column_names(), expected);
        assert_eq!(outcome.quarantine.row_count(), 1);
        assert_eq!(
            outcome.reasons[0],
            vec![RejectReason::MissingField {
                column: "item_id".into()
            }]
        );
        assert_eq!(
            outcome.quarantine.column("amount").unwrap().values()[0],
            Value::Float(12.5)
        );
        Ok(())
    }

    #[test]
    fn test_keep_first_dedup() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &NAMES,
            vec![
                row(1, "2025-07-01", 1.0, "ARS"),
                row(1, "2025-07-02", 2.0, "ARS"),
                row(2, "2025-07-03", 3.0, "ARS"),
            ],
        )?;

        let kept = router(DuplicateIds::Keep).route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(kept.clean.row_count(), 3);
        assert_eq!(kept.duplicates_removed, 0);

        let deduped =
            router(DuplicateIds::KeepFirst).route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(deduped.clean.row_count(), 2);
        assert_eq!(deduped.duplicates_removed, 1);
        assert_eq!(
            deduped.clean.column("amount").unwrap().values()[0],
            Value::Float(1.0)
        );
        assert_eq!(deduped.summary().input_rows, 3);
        Ok(())
    }

    #[test]
    fn test_opt_in_iqr_quarantine() -> anyhow::Result<()> {
        let rows = [10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 36.0]
            .iter()
            .enumerate()
            .map(|(i, a)| row(i as i64 + 1, "2025-07-01", *a, "USD"))
            .collect();
        let table = Table::from_rows(&NAMES, rows)?;

        let plain = router(DuplicateIds::Keep).route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(plain.quarantine.row_count(), 0);

        let mut policy = RoutingPolicy::new(DuplicateIds::Keep);
        policy.iqr_k = Some(1.5);
        let outcome = Router::new(policy)?.route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(outcome.quarantine.row_count(), 1);
        assert_eq!(
            outcome.reasons[0],
            vec![RejectReason::AmountOutlier { amount: 36.0 }]
        );
        Ok(())
    }

    #[test]
    fn test_routing_is_deterministic() -> anyhow::Result<()> {
        let table = Table::from_rows(
            &NAMES,
            vec![row(1, "2025-07-01", 1.0, "ARS"), row(2, "2099-07-01", 1.0, "ARS")],
        )?;
        let r = router(DuplicateIds::Keep);
        let a = r.route(&table, today(), &mut MemorySink::default())?;
        let b = r.route(&table, today(), &mut MemorySink::default())?;
        assert_eq!(a, b);
        Ok(())
    }
}
