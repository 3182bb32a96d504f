//! slotdb - A shared record store with typed fields and store-wide locking.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            slotdb                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query Layer (query/)                        │   │
//! │  │   first/next traversal + resumable search + queries      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Store Handle (store/) + Records (record/)         │   │
//! │  │    attach / detach / destroy, create / set / get         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                            ↓                  │
//! │  ┌──────────────────────────┐  ┌─────────────────────────┐     │
//! │  │  Lock Layer (lock/)      │  │  Field Codec (codec/)   │     │
//! │  │  read / write scopes     │  │  EncodedValue + types   │     │
//! │  └──────────────────────────┘  └─────────────────────────┘     │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │     Registry + Segment + slot table + statistics         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (RecordId, SegmentId, Error, config)
//! - [`codec`] - Field types, encoded values, ordering
//! - [`storage`] - Segment registry and the shared segments
//! - [`lock`] - Store-wide read/write scopes
//! - [`store`] - Store handles and their lifecycle
//! - [`record`] - Record and field operations
//! - [`query`] - Traversal, search and queries
//!
//! # Quick Start
//! ```
//! use slotdb::{Condition, Store, StoreConfig, Registry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//! let store = Store::attach_in(&registry, "quickstart", StoreConfig::default()).unwrap();
//!
//! {
//!     let _write = store.write().unwrap();
//!     let record = store.create_record(2).unwrap();
//!     store.set_int_field(record, 0, 12).unwrap();
//!     store.set_bytes_field(record, 1, "Test").unwrap();
//! }
//!
//! let _read = store.read().unwrap();
//! let found = store.find_record_int(0, Condition::Equal, 12, None).unwrap();
//! assert_eq!(&store.get_bytes_field(found, 1).unwrap()[..], b"Test");
//! ```

pub mod codec;
pub mod common;
pub mod lock;
pub mod query;
pub mod record;
pub mod storage;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_STORE_SIZE, MIN_STORE_SIZE};
pub use common::{Error, RecordId, Result, SegmentId, StoreConfig};

pub use codec::{EncodedValue, FieldType};
pub use lock::{LockKind, LockStatus, LockToken, ReadGuard, WriteGuard};
pub use query::{Condition, Query, QueryArg, QueryKind};
pub use record::Record;
pub use storage::{Registry, SegmentStats, StatsSnapshot};
pub use store::Store;
