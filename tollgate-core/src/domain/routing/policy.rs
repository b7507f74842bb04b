// tollgate-core/src/domain/routing/policy.rs

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;

pub const DEFAULT_AMOUNT_CEILING: f64 = 10_000_000.0;

/// What happens to rows sharing an `id`. There is deliberately no default:
/// deduplication changes output row counts, so callers must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateIds {
    /// Route every row, duplicates included.
    Keep,
    /// Drop later rows whose `id` was already seen, before routing.
    KeepFirst,
}

/// Logical record fields mapped to the batch's column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_distinct_fields"))]
pub struct FieldMap {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub party_id: String,
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(length(min = 1))]
    pub date: String,
    #[validate(length(min = 1))]
    pub amount: String,
    #[validate(length(min = 1))]
    pub currency: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            party_id: "party_id".to_string(),
            item_id: "item_id".to_string(),
            date: "date".to_string(),
            amount: "amount".to_string(),
            currency: "currency".to_string(),
        }
    }
}

fn validate_distinct_fields(fields: &FieldMap) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in fields.canonical() {
        if !seen.insert(name) {
            return Err(ValidationError::new("duplicate_field")
                .with_message(Cow::from(format!("Column '{}' is mapped twice", name))));
        }
    }
    Ok(())
}

impl FieldMap {
    /// Required columns in canonical output order.
    pub fn canonical(&self) -> [&str; 6] {
        [
            &self.id,
            &self.party_id,
            &self.item_id,
            &self.date,
            &self.amount,
            &self.currency,
        ]
    }

    /// Maps a logical field name to its column; anything else is taken as a column name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match name {
            "id" => &self.id,
            "party_id" => &self.party_id,
            "item_id" => &self.item_id,
            "date" => &self.date,
            "amount" => &self.amount,
            "currency" => &self.currency,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RoutingPolicy {
    #[serde(default)]
    #[validate(nested)]
    pub fields: FieldMap,

    #[serde(default = "default_currencies")]
    #[validate(length(min = 1, message = "allowed_currencies cannot be empty"))]
    pub allowed_currencies: Vec<String>,

    #[serde(default = "default_amount_ceiling")]
    #[validate(range(min = 0.0, message = "amount_ceiling must be non-negative"))]
    pub amount_ceiling: f64,

    /// Uppercase currency codes and the allow-list before the domain test.
    /// Surrounding blanks are always trimmed.
    #[serde(default)]
    pub normalize_currency: bool,

    pub duplicate_ids: DuplicateIds,

    /// Opt-in IQR outlier quarantine on `amount`. Makes membership depend on the whole batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "iqr_k must be non-negative"))]
    pub iqr_k: Option<f64>,
}

fn default_currencies() -> Vec<String> {
    vec!["ARS".to_string(), "USD".to_string()]
}

fn default_amount_ceiling() -> f64 {
    DEFAULT_AMOUNT_CEILING
}

impl RoutingPolicy {
    pub fn new(duplicate_ids: DuplicateIds) -> Self {
        Self {
            fields: FieldMap::default(),
            allowed_currencies: default_currencies(),
            amount_ceiling: DEFAULT_AMOUNT_CEILING,
            normalize_currency: false,
            duplicate_ids,
            iqr_k: None,
        }
    }

    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidRoutingPolicy(e.to_string()))
    }
}
