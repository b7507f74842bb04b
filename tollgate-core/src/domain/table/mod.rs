// tollgate-core/src/domain/table/mod.rs

pub mod value;

pub use value::{SemanticType, Value};

use crate::domain::error::DomainError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Realized type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Declared(SemanticType),
    Mixed,
    Empty,
}

impl ColumnType {
    /// Infers the tag from the non-null values. Integers mixed with floats widen to float.
    pub fn infer(values: &[Value]) -> Self {
        let mut seen: Option<SemanticType> = None;
        for ty in values.iter().filter_map(Value::semantic_type) {
            seen = match (seen, ty) {
                (None, t) => Some(t),
                (Some(a), b) if a == b => Some(a),
                (Some(SemanticType::Integer), SemanticType::Float)
                | (Some(SemanticType::Float), SemanticType::Integer) => Some(SemanticType::Float),
                _ => return ColumnType::Mixed,
            };
        }
        seen.map_or(ColumnType::Empty, ColumnType::Declared)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Declared(t) => write!(f, "{}", t),
            ColumnType::Mixed => write!(f, "mixed"),
            ColumnType::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Column whose type tag is inferred from its values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = ColumnType::infer(&values);
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Column carrying an explicit storage type (what a loader read from the source schema).
    pub fn with_type(name: impl Into<String>, dtype: SemanticType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype: ColumnType::Declared(dtype),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coerces every value to `target`; failures become nulls.
    pub fn coerced(&self, target: SemanticType) -> Column {
        Column::with_type(
            self.name.clone(),
            target,
            self.values.iter().map(|v| v.coerce(target)).collect(),
        )
    }

    fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

/// In-memory batch: ordered named columns with a fixed row count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, DomainError> {
        let row_count = columns.first().map_or(0, Column::len);

        let mut names = HashSet::new();
        for col in &columns {
            if !names.insert(col.name()) {
                return Err(DomainError::SchemaError(format!(
                    "Duplicate column '{}'",
                    col.name()
                )));
            }
            if col.len() != row_count {
                return Err(DomainError::SchemaError(format!(
                    "Column '{}' has {} values, expected {}",
                    col.name(),
                    col.len(),
                    row_count
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Builds a table from row-major data, inferring column types.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> Result<Self, DomainError> {
        let mut buffers: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DomainError::SchemaError(format!(
                    "Row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    names.len()
                )));
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = names
            .iter()
            .zip(buffers)
            .map(|(name, values)| Column::new(name.as_ref(), values))
            .collect();
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        (index < self.row_count).then(|| self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// New table holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }

    /// Replaces (or appends) a column. The column must match the row count.
    pub fn with_column(mut self, column: Column) -> Result<Table, DomainError> {
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(DomainError::SchemaError(format!(
                "Column '{}' has {} values, expected {}",
                column.name,
                column.len(),
                self.row_count
            )));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }
}
