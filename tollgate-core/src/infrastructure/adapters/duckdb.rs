// tollgate-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

// Imports Hexagonaux
use crate::domain::table::{Column, ColumnType, SemanticType, Table, Value};
use crate::error::TollgateError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::TableStore;

const STAGING: &str = "__tollgate_stage";

/// CSV in and out through DuckDB (`read_csv_auto` / `COPY`).
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbStore {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, InfrastructureError> {
        Self::new(":memory:")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, InfrastructureError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))
    }
}

/// DuckDB storage type -> declared semantic type.
pub fn semantic_type_of(sql_type: &str) -> SemanticType {
    let upper = sql_type.to_uppercase();
    match upper.as_str() {
        "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "HUGEINT" | "UTINYINT" | "USMALLINT"
        | "UINTEGER" | "UBIGINT" => SemanticType::Integer,
        "FLOAT" | "REAL" | "DOUBLE" => SemanticType::Float,
        "DATE" => SemanticType::Temporal,
        t if t.starts_with("DECIMAL") => SemanticType::Float,
        t if t.starts_with("TIMESTAMP") => SemanticType::Temporal,
        _ => SemanticType::Text,
    }
}

fn sql_type_of(dtype: ColumnType) -> &'static str {
    match dtype {
        ColumnType::Declared(SemanticType::Integer) => "BIGINT",
        ColumnType::Declared(SemanticType::Float) => "DOUBLE",
        ColumnType::Declared(SemanticType::Temporal) => "DATE",
        ColumnType::Declared(SemanticType::Text) | ColumnType::Mixed | ColumnType::Empty => {
            "VARCHAR"
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "''"))
}

/// Text form bound into prepared statements; DuckDB casts it to the column type.
fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Float(f) if !f.is_finite() => None,
        other => Some(other.to_string()),
    }
}

/// Creates the staging table for `table` and inserts its rows.
fn stage(conn: &Connection, table: &Table, all_varchar: bool) -> Result<(), InfrastructureError> {
    let defs: Vec<String> = table
        .columns()
        .iter()
        .map(|c| {
            let ty = if all_varchar {
                "VARCHAR"
            } else {
                sql_type_of(c.dtype())
            };
            format!("{} {}", quote_ident(c.name()), ty)
        })
        .collect();
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TEMP TABLE {} ({})",
        quote_ident(STAGING),
        defs.join(", ")
    ))?;
    Ok(())
}

fn insert_rows(conn: &Connection, table: &Table) -> Result<(), InfrastructureError> {
    let placeholders = vec!["?"; table.columns().len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(STAGING),
        placeholders
    ))?;
    for i in 0..table.row_count() {
        let cells: Vec<Option<String>> = table
            .columns()
            .iter()
            .map(|c| cell(&c.values()[i]))
            .collect();
        stmt.execute(params_from_iter(cells.iter()))?;
    }
    Ok(())
}

fn copy_out(conn: &Connection, path: &Path) -> Result<(), InfrastructureError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    conn.execute_batch(&format!(
        "COPY {} TO {} (HEADER, DELIMITER ','); DROP TABLE IF EXISTS {};",
        quote_ident(STAGING),
        quote_path(path),
        quote_ident(STAGING)
    ))?;
    Ok(())
}

#[async_trait]
impl TableStore for DuckDbStore {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn load_table(&self, path: &Path) -> Result<Table, TollgateError> {
        if !path.exists() {
            return Err(InfrastructureError::InputNotFound(path.display().to_string()).into());
        }
        let conn = self.lock()?;

        // 1. Staging via read_csv_auto (types detected by DuckDB)
        conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} AS SELECT * FROM read_csv_auto({}, header = true)",
            quote_ident(STAGING),
            quote_path(path)
        ))
        .map_err(InfrastructureError::from)?;

        // 2. Schema
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info('{}')", STAGING))
            .map_err(InfrastructureError::from)?;
        let schema = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>("name")?, row.get::<_, String>("type")?))
            })
            .map_err(InfrastructureError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(InfrastructureError::from)?;

        // 3. Rows, read back as text and coerced to the detected type
        let select = schema
            .iter()
            .map(|(name, _)| format!("CAST({} AS VARCHAR)", quote_ident(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut buffers: Vec<Vec<Value>> = vec![Vec::new(); schema.len()];
        if !schema.is_empty() {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM {}", select, quote_ident(STAGING)))
                .map_err(InfrastructureError::from)?;
            let mut rows = stmt.query([]).map_err(InfrastructureError::from)?;
            while let Some(row) = rows.next().map_err(InfrastructureError::from)? {
                for (i, buffer) in buffers.iter_mut().enumerate() {
                    let raw: Option<String> = row.get(i).map_err(InfrastructureError::from)?;
                    buffer.push(raw.map_or(Value::Null, Value::Text));
                }
            }
        }
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(STAGING)))
            .map_err(InfrastructureError::from)?;

        let columns = schema
            .into_iter()
            .zip(buffers)
            .map(|((name, sql_type), raw)| {
                let ty = semantic_type_of(&sql_type);
                Column::new(name.as_str(), raw).coerced(ty)
            })
            .collect();
        let table = Table::new(columns)?;
        debug!(rows = table.row_count(), columns = table.columns().len(), "CSV loaded");
        Ok(table)
    }

    #[instrument(skip(self, table), fields(path = %path.display(), rows = table.row_count()))]
    async fn write_table(&self, table: &Table, path: &Path) -> Result<(), TollgateError> {
        if table.columns().is_empty() {
            crate::infrastructure::fs::atomic_write(path, "")?;
            return Ok(());
        }
        let conn = self.lock()?;
        stage(&conn, table, false)?;
        insert_rows(&conn, table)?;
        copy_out(&conn, path)?;
        Ok(())
    }

    #[instrument(skip(self, table), fields(path = %path.display(), rows = table.row_count()))]
    async fn append_table(&self, table: &Table, path: &Path) -> Result<(), TollgateError> {
        let conn = self.lock()?;
        stage(&conn, table, true)?;
        if path.exists() {
            conn.execute_batch(&format!(
                "INSERT INTO {} SELECT * FROM read_csv({}, header = true, all_varchar = true)",
                quote_ident(STAGING),
                quote_path(path)
            ))
            .map_err(InfrastructureError::from)?;
        }
        insert_rows(&conn, table)?;
        copy_out(&conn, path)?;
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_storage_type_mapping() {
        assert_eq!(semantic_type_of("BIGINT"), SemanticType::Integer);
        assert_eq!(semantic_type_of("DECIMAL(18,3)"), SemanticType::Float);
        assert_eq!(semantic_type_of("TIMESTAMP WITH TIME ZONE"), SemanticType::Temporal);
        assert_eq!(semantic_type_of("date"), SemanticType::Temporal);
        assert_eq!(semantic_type_of("VARCHAR"), SemanticType::Text);
        assert_eq!(semantic_type_of("BOOLEAN"), SemanticType::Text);
    }

    #[tokio::test]
    async fn test_load_detects_types_and_nulls() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sales.csv");
        fs::write(
            &path,
            "id,date,amount,currency\n1,2025-07-01,150.5,ARS\n2,,20.0,usd\n",
        )?;

        let store = DuckDbStore::in_memory()?;
        let table = store.load_table(&path).await?;

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["id", "date", "amount", "currency"]);
        let id = table.column("id").unwrap();
        assert_eq!(id.dtype(), ColumnType::Declared(SemanticType::Integer));
        assert_eq!(id.values()[1], Value::Integer(2));
        let date = table.column("date").unwrap();
        assert_eq!(date.dtype(), ColumnType::Declared(SemanticType::Temporal));
        assert_eq!(
            date.values()[0],
            Value::Date(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        );
        assert_eq!(date.values()[1], Value::Null);
        assert_eq!(
            table.column("amount").unwrap().dtype(),
            ColumnType::Declared(SemanticType::Float)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unparseable_values_keep_text_type() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dirty.csv");
        fs::write(&path, "id,amount\n1,12.5\n2,abc\n")?;

        let table = DuckDbStore::in_memory()?.load_table(&path).await?;
        let amount = table.column("amount").unwrap();
        assert_eq!(amount.dtype(), ColumnType::Declared(SemanticType::Text));
        assert_eq!(amount.values()[1], Value::from("abc"));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out").join("silver.csv");
        let table = Table::new(vec![
            Column::with_type("id", SemanticType::Integer, vec![Value::Integer(1), Value::Integer(2)]),
            Column::with_type(
                "date",
                SemanticType::Temporal,
                vec![Value::Date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()), Value::Null],
            ),
            Column::with_type("note", SemanticType::Text, vec![Value::from("it's"), Value::Null]),
        ])?;

        let store = DuckDbStore::in_memory()?;
        store.write_table(&table, &path).await?;
        let content = fs::read_to_string(&path)?;
        assert!(content.starts_with("id,date,note"));

        let back = store.load_table(&path).await?;
        assert_eq!(back.row_count(), 2);
        assert_eq!(back.column("note").unwrap().values()[0], Value::from("it's"));
        assert_eq!(back.column("date").unwrap().values()[1], Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn test_append_keeps_previous_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.csv");
        let rows = |msg: &str| {
            Table::from_rows(&["batch", "message"], vec![vec![Value::from("b1"), Value::from(msg)]])
        };

        let store = DuckDbStore::in_memory()?;
        store.append_table(&rows("first")?, &path).await?;
        store.append_table(&rows("second")?, &path).await?;

        let table = store.load_table(&path).await?;
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("message").unwrap().values()[1], Value::from("second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_input() -> Result<()> {
        let store = DuckDbStore::in_memory()?;
        let res = store.load_table(Path::new("/definitely/not/here.csv")).await;
        assert!(matches!(
            res,
            Err(TollgateError::Infrastructure(InfrastructureError::InputNotFound(_)))
        ));
        assert_eq!(store.engine_name(), "duckdb");
        Ok(())
    }
}
