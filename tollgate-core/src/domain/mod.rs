// tollgate-core/src/domain/mod.rs

pub mod error;
pub mod gold;
pub mod ports;
pub mod project;
pub mod quality;
pub mod routing;
pub mod table;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
