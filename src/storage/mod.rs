//! Storage layer - the shared segments behind named stores.
//!
//! This module is the backend the client layer talks to:
//! - [`Registry`] - Namespace of named segments with handle counting
//! - [`Segment`] - Slot table, size budget, lock manager and statistics
//! - [`SegmentStats`] - Atomic counters shared by every attached handle

mod registry;
mod segment;
mod slot;
mod stats;

pub use registry::Registry;
pub use segment::Segment;
pub use stats::{SegmentStats, StatsSnapshot};

pub(crate) use segment::WriteMode;
