// tollgate-core/src/ports/connector.rs

// What the pipeline needs from a storage engine, without knowing which one answers.
// The core only ever sees in-memory `Table`s; files are the adapter's business.

use crate::domain::table::Table;
use crate::error::TollgateError;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads a CSV file into a table, keeping the storage types the engine detected.
    async fn load_table(&self, path: &Path) -> Result<Table, TollgateError>;

    /// Writes `table` as CSV, replacing any previous file.
    async fn write_table(&self, table: &Table, path: &Path) -> Result<(), TollgateError>;

    /// Appends rows to a CSV file, creating it with a header when absent.
    /// Existing rows are kept as text.
    async fn append_table(&self, table: &Table, path: &Path) -> Result<(), TollgateError>;

    fn engine_name(&self) -> &str;
}
