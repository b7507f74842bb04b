// tollgate-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(tollgate::infra::database::duckdb),
        help("An error occurred inside the SQL engine while reading or writing a CSV file.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DuckDB connection lock poisoned")]
    #[diagnostic(code(tollgate::infra::database::poisoned))]
    Poisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(tollgate::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Input file not found: '{0}'")]
    #[diagnostic(code(tollgate::infra::missing_input))]
    InputNotFound(String),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error in '{path}': {source}")]
    #[diagnostic(
        code(tollgate::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(tollgate::infra::config_missing),
        help("Create a tollgate.yaml at the project root, or run `tollgate seed`.")
    )]
    ConfigNotFound(String),

    // --- REPORTS ---
    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(tollgate::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(tollgate::infra::template),
        help("Check the Jinja syntax of the report template.")
    )]
    TemplateError(#[from] minijinja::Error),
}

impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
