// tollgate-core/src/domain/gold/mod.rs
//
// Derived summary views over the clean tier. Always recomputed from scratch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;
use crate::domain::routing::FieldMap;
use crate::domain::table::{Column, SemanticType, Table, Value};

pub const TOTAL_COLUMN: &str = "amount_total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ViewSpec {
    #[validate(custom(function = "validate_view_name"))]
    pub name: String,
    /// Logical field names (`date`, `party_id`...) or raw column names.
    #[validate(length(min = 1, message = "A view needs at least one grouping column"))]
    pub group_by: Vec<String>,
}

impl ViewSpec {
    pub fn new(name: impl Into<String>, group_by: &[&str]) -> Self {
        Self {
            name: name.into(),
            group_by: group_by.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GoldConfig {
    #[serde(default = "default_views")]
    #[validate(nested)]
    #[validate(custom(function = "validate_unique_views"))]
    pub views: Vec<ViewSpec>,
}

impl Default for GoldConfig {
    fn default() -> Self {
        Self {
            views: default_views(),
        }
    }
}

impl GoldConfig {
    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        self.validate().map_err(|e| DomainError::InvalidView {
            view: "gold".to_string(),
            reason: e.to_string(),
        })
    }
}

fn default_views() -> Vec<ViewSpec> {
    vec![
        ViewSpec::new("daily_by_currency", &["date", "currency"]),
        ViewSpec::new("by_party", &["party_id", "currency"]),
    ]
}

// View names end up in file names.
fn validate_view_name(name: &str) -> Result<(), ValidationError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !ok {
        return Err(ValidationError::new("view_name").with_message(Cow::from(format!(
            "Invalid view name '{}': use letters, digits, '_' or '-'",
            name
        ))));
    }
    Ok(())
}

fn validate_unique_views(views: &[ViewSpec]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for view in views {
        if !seen.insert(view.name.as_str()) {
            return Err(ValidationError::new("duplicate_view")
                .with_message(Cow::from(format!("View '{}' is declared twice", view.name))));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<Value>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub name: String,
    pub key_columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateView {
    /// `<key columns..>, amount_total`, one row per group.
    pub fn to_table(&self) -> Result<Table, DomainError> {
        let mut columns: Vec<Column> = self
            .key_columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Column::new(
                    name.as_str(),
                    self.rows.iter().map(|r| r.key[i].clone()).collect(),
                )
            })
            .collect();
        columns.push(Column::with_type(
            TOTAL_COLUMN,
            SemanticType::Float,
            self.rows.iter().map(|r| Value::Float(r.total)).collect(),
        ));
        Table::new(columns)
    }
}

/// Orderable form of a grouping value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Integer(i64),
    Float(TotalF64),
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TotalF64(f64);

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl KeyPart {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Integer(i) => Some(Self::Integer(*i)),
            Value::Float(f) if f.is_finite() => Some(Self::Float(TotalF64(*f))),
            Value::Float(_) => None,
            Value::Date(d) => Some(Self::Date(*d)),
            Value::Text(_) => value.as_text().map(Self::Text),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Integer(i) => Value::Integer(i),
            Self::Float(f) => Value::Float(f.0),
            Self::Date(d) => Value::Date(d),
            Self::Text(s) => Value::Text(s),
        }
    }
}

/// Builds every configured view from the clean tier. Pure: same input, same output.
#[instrument(skip_all, fields(rows = clean.row_count(), views = config.views.len()))]
pub fn aggregate(
    clean: &Table,
    config: &GoldConfig,
    fields: &FieldMap,
) -> Result<Vec<AggregateView>, DomainError> {
    let amount = clean
        .column(&fields.amount)
        .ok_or_else(|| DomainError::InvalidView {
            view: "*".to_string(),
            reason: format!("Measure column '{}' is missing", fields.amount),
        })?;

    config
        .views
        .iter()
        .map(|view| aggregate_view(clean, amount, view, fields))
        .collect()
}

fn aggregate_view(
    clean: &Table,
    amount: &Column,
    view: &ViewSpec,
    fields: &FieldMap,
) -> Result<AggregateView, DomainError> {
    let key_columns: Vec<&Column> = view
        .group_by
        .iter()
        .map(|name| {
            let resolved = fields.resolve(name);
            clean.column(resolved).ok_or_else(|| DomainError::InvalidView {
                view: view.name.clone(),
                reason: format!("Grouping column '{}' is missing", resolved),
            })
        })
        .collect::<Result<_, _>>()?;

    let mut groups: BTreeMap<Vec<KeyPart>, f64> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in 0..clean.row_count() {
        let key: Option<Vec<KeyPart>> = key_columns
            .iter()
            .map(|c| KeyPart::from_value(&c.values()[row]))
            .collect();
        match (key, amount.values()[row].as_f64()) {
            (Some(key), Some(value)) => *groups.entry(key).or_insert(0.0) += value,
            _ => skipped += 1,
        }
    }
    debug!(view = %view.name, groups = groups.len(), skipped, "View aggregated");

    Ok(AggregateView {
        name: view.name.clone(),
        key_columns: key_columns.iter().map(|c| c.name().to_string()).collect(),
        rows: groups
            .into_iter()
            .map(|(key, total)| AggregateRow {
                key: key.into_iter().map(KeyPart::into_value).collect(),
                total,
            })
            .collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> Value {
        Value::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn clean() -> Table {
        Table::new(vec![
            Column::with_type(
                "party_id",
                SemanticType::Integer,
                vec![Value::Integer(7), Value::Integer(3), Value::Integer(7), Value::Integer(3)],
            ),
            Column::with_type(
                "date",
                SemanticType::Temporal,
                vec![date("2025-07-02"), date("2025-07-01"), Value::Null, date("2025-07-01")],
            ),
            Column::with_type(
                "amount",
                SemanticType::Float,
                vec![Value::Float(10.0), Value::Float(5.5), Value::Float(1.0), Value::Float(4.5)],
            ),
            Column::with_type(
                "currency",
                SemanticType::Text,
                vec![Value::from("USD"), Value::from("ARS"), Value::from("USD"), Value::from("ARS")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_views() -> anyhow::Result<()> {
        let views = aggregate(&clean(), &GoldConfig::default(), &FieldMap::default())?;
        assert_eq!(views.len(), 2);

        let daily = &views[0];
        assert_eq!(daily.key_columns, vec!["date", "currency"]);
        // The null-date row is left out of the date-keyed view only.
        assert_eq!(daily.rows.len(), 2);
        assert_eq!(daily.rows[0].key, vec![date("2025-07-01"), Value::from("ARS")]);
        assert_eq!(daily.rows[0].total, 10.0);

        let by_party = &views[1];
        assert_eq!(by_party.rows.len(), 2);
        assert_eq!(by_party.rows[0].key, vec![Value::Integer(3), Value::from("ARS")]);
        assert_eq!(by_party.rows[1].total, 11.0);
        Ok(())
    }

    #[test]
    fn test_aggregation_is_idempotent() -> anyhow::Result<()> {
        let table = clean();
        let config = GoldConfig::default();
        let first = aggregate(&table, &config, &FieldMap::default())?;
        let second = aggregate(&table, &config, &FieldMap::default())?;
        assert_eq!(first, second);
        assert_eq!(first[0].to_table()?, second[0].to_table()?);
        Ok(())
    }

    #[test]
    fn test_view_to_table() -> anyhow::Result<()> {
        let views = aggregate(&clean(), &GoldConfig::default(), &FieldMap::default())?;
        let table = views[1].to_table()?;
        assert_eq!(table.column_names(), vec!["party_id", "currency", TOTAL_COLUMN]);
        assert_eq!(table.row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_grouping_column() {
        let config = GoldConfig {
            views: vec![ViewSpec::new("by_region", &["region"])],
        };
        let res = aggregate(&clean(), &config, &FieldMap::default());
        assert!(matches!(res, Err(DomainError::InvalidView { .. })));
    }

    #[test]
    fn test_config_validation() -> anyhow::Result<()> {
        let parsed: GoldConfig = serde_yaml::from_str("views:\n  - name: daily\n    group_by: [date]\n")?;
        parsed.ensure_valid()?;

        let dup = GoldConfig {
            views: vec![ViewSpec::new("a", &["date"]), ViewSpec::new("a", &["currency"])],
        };
        assert!(dup.ensure_valid().is_err());

        let bad_name = GoldConfig {
            views: vec![ViewSpec::new("../x", &["date"])],
        };
        assert!(bad_name.ensure_valid().is_err());
        Ok(())
    }
}
