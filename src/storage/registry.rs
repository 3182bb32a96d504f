//! Registry - the namespace of named segments.
//!
//! A [`Registry`] maps store addresses to segments and counts the handles
//! attached to each one. [`Registry::global`] is the process-wide namespace
//! used by [`Store::attach`](crate::Store::attach); a private registry gives
//! tests and embedders an isolated namespace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::debug;

use super::Segment;
use crate::common::config::MIN_STORE_SIZE;
use crate::common::{Error, Result, SegmentId, StoreConfig};

/// Segment id sequence shared by every registry, so handles from one
/// registry never match a segment of another.
static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// A registered segment and its attach count.
#[derive(Debug)]
struct Entry {
    segment: Arc<Segment>,
    handles: usize,
}

/// Namespace of named segments.
///
/// # Thread Safety
/// - `segments`: `Mutex` - attach, detach and destroy are serialized
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use slotdb::{Registry, Store, StoreConfig};
///
/// let registry = Arc::new(Registry::new());
/// let store = Store::attach_in(&registry, "inventory", StoreConfig::default()).unwrap();
/// assert!(registry.contains("inventory"));
///
/// store.detach();
/// registry.destroy("inventory").unwrap();
/// ```
#[derive(Debug)]
pub struct Registry {
    segments: Mutex<HashMap<String, Entry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            segments: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Registry::new())))
    }

    /// Attach to the segment at `address`, creating it if absent.
    ///
    /// The size budget in `config` only matters when the segment is created.
    ///
    /// # Errors
    /// - `Error::AttachFailed` for an empty address, or for a size budget
    ///   below `MIN_STORE_SIZE` when creating
    pub(crate) fn attach(&self, address: &str, config: &StoreConfig) -> Result<Arc<Segment>> {
        if address.is_empty() {
            return Err(Error::AttachFailed {
                address: address.to_string(),
                reason: "address is empty".to_string(),
            });
        }

        let mut segments = self.segments.lock();

        if let Some(entry) = segments.get_mut(address) {
            entry.handles += 1;
            debug!(address, segment = %entry.segment.id(), handles = entry.handles, "joined store");
            return Ok(Arc::clone(&entry.segment));
        }

        if config.size_bytes < MIN_STORE_SIZE {
            return Err(Error::AttachFailed {
                address: address.to_string(),
                reason: format!(
                    "size {} is below the minimum of {} bytes",
                    config.size_bytes, MIN_STORE_SIZE
                ),
            });
        }

        let id = SegmentId::new(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed));
        let segment = Arc::new(Segment::new(id, address, config));
        segments.insert(
            address.to_string(),
            Entry {
                segment: Arc::clone(&segment),
                handles: 1,
            },
        );
        debug!(address, segment = %id, size = config.size_bytes, "created store");

        Ok(segment)
    }

    /// Release one handle on `segment`.
    ///
    /// A segment that was destroyed and recreated under the same address is
    /// left alone.
    pub(crate) fn detach(&self, segment: &Segment) {
        let mut segments = self.segments.lock();
        if let Some(entry) = segments.get_mut(segment.address()) {
            if entry.segment.id() == segment.id() {
                entry.handles = entry.handles.saturating_sub(1);
                debug!(address = segment.address(), segment = %segment.id(), handles = entry.handles, "detached from store");
            }
        }
    }

    /// Remove the segment at `address` and everything stored in it.
    ///
    /// # Errors
    /// - `Error::DestroyFailed` if no segment is registered there, or if
    ///   handles are still attached
    pub fn destroy(&self, address: &str) -> Result<()> {
        let mut segments = self.segments.lock();

        let handles = match segments.get(address) {
            Some(entry) => entry.handles,
            None => {
                return Err(Error::DestroyFailed {
                    address: address.to_string(),
                    reason: "no such store".to_string(),
                })
            }
        };

        if handles > 0 {
            return Err(Error::DestroyFailed {
                address: address.to_string(),
                reason: format!("{} handle(s) still attached", handles),
            });
        }

        segments.remove(address);
        debug!(address, "destroyed store");
        Ok(())
    }

    /// Whether a segment is registered at `address`.
    pub fn contains(&self, address: &str) -> bool {
        self.segments.lock().contains_key(address)
    }

    /// Number of handles attached to the segment at `address`.
    pub fn handle_count(&self, address: &str) -> usize {
        self.segments
            .lock()
            .get(address)
            .map_or(0, |entry| entry.handles)
    }

    /// Number of registered segments.
    pub fn len(&self) -> usize {
        self.segments.lock().len()
    }

    /// Whether no segment is registered.
    pub fn is_empty(&self) -> bool {
        self.segments.lock().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
