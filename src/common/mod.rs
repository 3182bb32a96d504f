//! Common types and utilities shared across slotdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`StoreConfig`]
//! - Error types
//! - Identifiers (RecordId, SegmentId)

pub mod config;
pub mod error;
mod record_id;
mod segment_id;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use record_id::RecordId;
pub use segment_id::SegmentId;
