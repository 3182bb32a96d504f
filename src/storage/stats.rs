//! Segment statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by a segment.
///
/// All fields are atomic for lock-free, thread-safe updates. Every handle
/// attached to the segment updates the same counters.
///
/// # Memory Ordering
/// All operations use `Ordering::Relaxed`: counters are independent and only
/// need atomicity, not ordering with each other.
///
/// # Example
/// ```
/// use slotdb::SegmentStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = SegmentStats::new();
/// stats.records_created.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().records_created, 1);
/// ```
#[derive(Debug)]
pub struct SegmentStats {
    /// Records allocated (indexed and raw).
    pub records_created: AtomicU64,

    /// Records freed.
    pub records_deleted: AtomicU64,

    /// Successful field writes.
    pub field_writes: AtomicU64,

    /// Read scopes granted.
    pub read_locks: AtomicU64,

    /// Write scopes granted.
    pub write_locks: AtomicU64,

    /// Lock requests that had to block.
    pub lock_waits: AtomicU64,

    /// Lock requests that gave up after the configured timeout.
    pub lock_timeouts: AtomicU64,
}

impl SegmentStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            records_created: AtomicU64::new(0),
            records_deleted: AtomicU64::new(0),
            field_writes: AtomicU64::new(0),
            read_locks: AtomicU64::new(0),
            write_locks: AtomicU64::new(0),
            lock_waits: AtomicU64::new(0),
            lock_timeouts: AtomicU64::new(0),
        }
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_created: self.records_created.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
            field_writes: self.field_writes.load(Ordering::Relaxed),
            read_locks: self.read_locks.load(Ordering::Relaxed),
            write_locks: self.write_locks.load(Ordering::Relaxed),
            lock_waits: self.lock_waits.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.records_created.store(0, Ordering::Relaxed);
        self.records_deleted.store(0, Ordering::Relaxed);
        self.field_writes.store(0, Ordering::Relaxed);
        self.read_locks.store(0, Ordering::Relaxed);
        self.write_locks.store(0, Ordering::Relaxed);
        self.lock_waits.store(0, Ordering::Relaxed);
        self.lock_timeouts.store(0, Ordering::Relaxed);
    }
}

impl Default for SegmentStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of segment statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Records allocated since creation or the last reset.
    pub records_created: u64,
    /// Records freed.
    pub records_deleted: u64,
    /// Successful field writes.
    pub field_writes: u64,
    /// Read scopes granted.
    pub read_locks: u64,
    /// Write scopes granted.
    pub write_locks: u64,
    /// Granted lock requests that had to block first.
    pub lock_waits: u64,
    /// Lock requests that gave up after the configured timeout.
    pub lock_timeouts: u64,
}

impl StatsSnapshot {
    /// Records created and not yet deleted.
    pub fn live_records(&self) -> u64 {
        self.records_created.saturating_sub(self.records_deleted)
    }

    /// Fraction of granted lock requests that had to wait (0.0 to 1.0).
    pub fn contention_rate(&self) -> f64 {
        let granted = self.read_locks + self.write_locks;
        if granted == 0 {
            0.0
        } else {
            self.lock_waits as f64 / granted as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ records: {}, writes: {}, locks: {}r/{}w, contention: {:.2}% }}",
            self.live_records(),
            self.field_writes,
            self.read_locks,
            self.write_locks,
            self.contention_rate() * 100.0
        )
    }
}
