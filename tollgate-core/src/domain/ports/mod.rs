// tollgate-core/src/domain/ports/mod.rs

pub mod sink;

pub use sink::{MemorySink, ReportSink, TracingSink};
