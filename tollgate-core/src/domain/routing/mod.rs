// tollgate-core/src/domain/routing/mod.rs

pub mod policy;
pub mod router;

pub use policy::{DEFAULT_AMOUNT_CEILING, DuplicateIds, FieldMap, RoutingPolicy};
pub use router::{RejectReason, Router, RoutingOutcome, RoutingSummary};
