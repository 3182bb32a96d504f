//! Configuration constants and per-store settings for slotdb.

use std::time::Duration;

/// Size of one storage word in bytes.
///
/// Every record header and field slot occupies whole words, and out-of-line
/// payloads (doubles, strings, blobs) are rounded up to a word boundary when
/// charged against a store's size budget.
pub const WORD_SIZE: usize = 8;

/// Words of bookkeeping charged per record, on top of its field slots.
pub const RECORD_HEADER_WORDS: usize = 4;

/// Smallest size budget a store may be created with (one 4KB page).
pub const MIN_STORE_SIZE: usize = 4096;

/// Size budget used by [`StoreConfig::default`] (10MB).
pub const DEFAULT_STORE_SIZE: usize = 10 * 1024 * 1024;

/// Default upper bound on the field count of a single record.
///
/// Field indexes travel as 16-bit values, so this is the largest count such
/// an index can address.
pub const DEFAULT_MAX_FIELDS: usize = u16::MAX as usize;

/// Fixed-point values are stored as integers scaled by this factor.
pub const FIXPOINT_SCALE: f64 = 10_000.0;

/// Largest magnitude a fixed-point value may have.
pub const FIXPOINT_MAX: f64 = 800.0;

/// Number of centiseconds in one day; times must be below this.
pub const CENTISECONDS_PER_DAY: i32 = 24 * 60 * 60 * 100;

/// Settings used when a store is created.
///
/// Only `size_bytes` is fixed at creation time. Joining an existing store
/// keeps the creator's size budget and field limit, while `lock_timeout`
/// applies to whichever handle uses it.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use slotdb::StoreConfig;
///
/// let config = StoreConfig::new()
///     .size_bytes(2_000_000)
///     .lock_timeout(Some(Duration::from_secs(1)));
/// assert_eq!(config.size_bytes, 2_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Size budget of the segment in bytes.
    pub size_bytes: usize,

    /// Maximum field count accepted by record creation.
    pub max_fields: usize,

    /// How long a lock request may wait before failing.
    ///
    /// `None` blocks until the lock is granted.
    pub lock_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            size_bytes: DEFAULT_STORE_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
            lock_timeout: None,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size budget in bytes.
    #[must_use]
    pub const fn size_bytes(mut self, size: usize) -> Self {
        self.size_bytes = size;
        self
    }

    /// Sets the maximum field count per record.
    #[must_use]
    pub const fn max_fields(mut self, max: usize) -> Self {
        self.max_fields = max;
        self
    }

    /// Sets the lock wait timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Rounds a byte length up to whole words.
#[inline]
pub const fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(WORD_SIZE)
}
