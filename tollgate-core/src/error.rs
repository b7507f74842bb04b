// tollgate-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum TollgateError {
    // --- ERREURS DU DOMAINE (règles, politique de routage, vues gold) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, DuckDB, YAML) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS APPLICATIVES ---
    #[error("Unsafe path traversal detected: {0}")]
    #[diagnostic(code(tollgate::unsafe_path))]
    UnsafePath(String),

    #[error("No input batch found in '{0}'")]
    #[diagnostic(
        code(tollgate::no_batch),
        help("Drop CSV files into the bronze directory, or run `tollgate seed`.")
    )]
    NoBatches(String),
}

impl From<std::io::Error> for TollgateError {
    fn from(err: std::io::Error) -> Self {
        TollgateError::Infrastructure(InfrastructureError::Io(err))
    }
}
