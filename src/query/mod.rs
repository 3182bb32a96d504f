//! Query layer - traversal and search.
//!
//! - [`scan`] - `first_record` / `next_record` over every record
//! - [`search`] - Resumable single-field search over indexed records
//! - [`Query`] - Multi-condition queries, lazy or prefetched
//!
//! Traversal order is slot order. Records created or deleted concurrently
//! with a traversal may be skipped or seen; resuming after a deleted record
//! continues with the next live one.

mod compound;
mod condition;
pub mod scan;
pub mod search;

pub use compound::{Query, QueryArg, QueryKind};
pub use condition::Condition;
pub use scan::Records;
