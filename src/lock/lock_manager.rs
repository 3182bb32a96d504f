//! Lock Manager - store-wide read/write scopes.
//!
//! The [`LockManager`] lives inside a segment and is shared by every handle
//! attached to it. It implements the state machine
//!
//! ```text
//! Idle ──start_read──▶ ReadActive(n) ──end_read (n → 0)──▶ Idle
//! Idle ──start_write─▶ WriteActive   ──end_write─────────▶ Idle
//! ```
//!
//! Writers are preferred: once a writer is waiting, new readers queue behind
//! it, so a steady stream of readers cannot starve writers. This is a
//! best-effort policy; no ordering among waiters is promised.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::warn;

use super::{LockKind, LockToken};
use crate::common::{Error, Result, SegmentId};
use crate::storage::SegmentStats;

/// Observable state of the lock manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No scope is active.
    Idle,
    /// `n` read scopes are active.
    ReadActive(usize),
    /// A write scope is active.
    WriteActive,
}

#[derive(Debug, Default)]
struct LockState {
    /// Token id of the active writer.
    writer: Option<u64>,
    /// Token ids of active readers.
    readers: HashSet<u64>,
    /// Writers blocked in `start_write`.
    waiting_writers: usize,
}

impl LockState {
    #[inline]
    fn write_blocked(&self) -> bool {
        self.writer.is_some() || !self.readers.is_empty()
    }

    #[inline]
    fn read_blocked(&self) -> bool {
        self.writer.is_some() || self.waiting_writers > 0
    }
}

/// Issues and validates lock tokens for one segment.
///
/// # Thread Safety
/// - `state`: `Mutex` guarding the writer/reader sets
/// - `readers` / `writers`: `Condvar`s that blocked callers park on
/// - `next_id`: atomic token sequence
#[derive(Debug)]
pub struct LockManager {
    segment: SegmentId,
    state: Mutex<LockState>,
    readers: Condvar,
    writers: Condvar,
    next_id: AtomicU64,
}

impl LockManager {
    /// Create an idle lock manager for a segment.
    pub fn new(segment: SegmentId) -> Self {
        Self {
            segment,
            state: Mutex::new(LockState::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            next_id: AtomicU64::new(1),
        }
    }

    // ========================================================================
    // Write scopes
    // ========================================================================

    /// Start a write scope, blocking until no other scope is active.
    ///
    /// # Errors
    /// - `Error::LockFailed` if `timeout` elapses first
    pub fn start_write(&self, timeout: Option<Duration>, stats: &SegmentStats) -> Result<LockToken> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        if state.write_blocked() {
            stats.lock_waits.fetch_add(1, Ordering::Relaxed);
            state.waiting_writers += 1;

            while state.write_blocked() {
                if wait_on(&self.writers, &mut state, deadline) && state.write_blocked() {
                    state.waiting_writers -= 1;
                    if state.waiting_writers == 0 {
                        // Readers held back by this writer may proceed.
                        self.readers.notify_all();
                    }
                    stats.lock_timeouts.fetch_add(1, Ordering::Relaxed);
                    warn!(segment = %self.segment, "write lock wait timed out");
                    return Err(Error::LockFailed(format!(
                        "write lock not granted within {:?}",
                        timeout.unwrap_or_default()
                    )));
                }
            }

            state.waiting_writers -= 1;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state.writer = Some(id);
        stats.write_locks.fetch_add(1, Ordering::Relaxed);

        Ok(LockToken::new(self.segment, id, LockKind::Write))
    }

    /// End the write scope identified by `token`.
    ///
    /// # Errors
    /// - `Error::InvalidToken` unless `token` is this segment's active writer
    pub fn end_write(&self, token: LockToken) -> Result<()> {
        if token.segment() != self.segment || token.kind() != LockKind::Write {
            return Err(Error::InvalidToken(token));
        }

        let mut state = self.state.lock();
        if state.writer != Some(token.as_raw()) {
            return Err(Error::InvalidToken(token));
        }
        state.writer = None;
        drop(state);

        self.writers.notify_all();
        self.readers.notify_all();
        Ok(())
    }

    // ========================================================================
    // Read scopes
    // ========================================================================

    /// Start a read scope, blocking while a writer is active or waiting.
    ///
    /// # Errors
    /// - `Error::LockFailed` if `timeout` elapses first
    pub fn start_read(&self, timeout: Option<Duration>, stats: &SegmentStats) -> Result<LockToken> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        if state.read_blocked() {
            stats.lock_waits.fetch_add(1, Ordering::Relaxed);

            while state.read_blocked() {
                if wait_on(&self.readers, &mut state, deadline) && state.read_blocked() {
                    stats.lock_timeouts.fetch_add(1, Ordering::Relaxed);
                    warn!(segment = %self.segment, "read lock wait timed out");
                    return Err(Error::LockFailed(format!(
                        "read lock not granted within {:?}",
                        timeout.unwrap_or_default()
                    )));
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state.readers.insert(id);
        stats.read_locks.fetch_add(1, Ordering::Relaxed);

        Ok(LockToken::new(self.segment, id, LockKind::Read))
    }

    /// End the read scope identified by `token`.
    ///
    /// # Errors
    /// - `Error::InvalidToken` unless `token` is an active reader of this segment
    pub fn end_read(&self, token: LockToken) -> Result<()> {
        if token.segment() != self.segment || token.kind() != LockKind::Read {
            return Err(Error::InvalidToken(token));
        }

        let mut state = self.state.lock();
        if !state.readers.remove(&token.as_raw()) {
            return Err(Error::InvalidToken(token));
        }
        let now_idle = state.readers.is_empty();
        drop(state);

        if now_idle {
            self.writers.notify_all();
        }
        Ok(())
    }

    /// End a token of either kind.
    pub fn release(&self, token: LockToken) -> Result<()> {
        match token.kind() {
            LockKind::Read => self.end_read(token),
            LockKind::Write => self.end_write(token),
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Current state of the state machine.
    pub fn status(&self) -> LockStatus {
        let state = self.state.lock();
        if state.writer.is_some() {
            LockStatus::WriteActive
        } else if state.readers.is_empty() {
            LockStatus::Idle
        } else {
            LockStatus::ReadActive(state.readers.len())
        }
    }

    /// Number of writers currently blocked.
    pub fn waiting_writers(&self) -> usize {
        self.state.lock().waiting_writers
    }
}

/// Park on `cv`. Returns true if the deadline passed.
fn wait_on(cv: &Condvar, state: &mut MutexGuard<'_, LockState>, deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => cv.wait_until(state, deadline).timed_out(),
        None => {
            cv.wait(state);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn manager() -> (LockManager, SegmentStats) {
        (LockManager::new(SegmentId::new(1)), SegmentStats::new())
    }

    #[test]
    fn test_write_then_idle() {
        let (locks, stats) = manager();

        let token = locks.start_write(None, &stats).unwrap();
        assert_eq!(token.kind(), LockKind::Write);
        assert_eq!(locks.status(), LockStatus::WriteActive);

        locks.end_write(token).unwrap();
        assert_eq!(locks.status(), LockStatus::Idle);
    }

    #[test]
    fn test_readers_share() {
        let (locks, stats) = manager();

        let r1 = locks.start_read(None, &stats).unwrap();
        let r2 = locks.start_read(None, &stats).unwrap();
        assert_eq!(locks.status(), LockStatus::ReadActive(2));

        locks.end_read(r1).unwrap();
        assert_eq!(locks.status(), LockStatus::ReadActive(1));
        locks.end_read(r2).unwrap();
        assert_eq!(locks.status(), LockStatus::Idle);
    }

    #[test]
    fn test_end_twice_is_invalid() {
        let (locks, stats) = manager();

        let token = locks.start_write(None, &stats).unwrap();
        locks.end_write(token).unwrap();
        assert!(matches!(locks.end_write(token), Err(Error::InvalidToken(_))));

        let token = locks.start_read(None, &stats).unwrap();
        locks.end_read(token).unwrap();
        assert!(matches!(locks.end_read(token), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_mismatched_end_is_invalid() {
        let (locks, stats) = manager();

        let read = locks.start_read(None, &stats).unwrap();
        assert!(matches!(locks.end_write(read), Err(Error::InvalidToken(_))));
        // Token is still active after the failed end.
        assert_eq!(locks.status(), LockStatus::ReadActive(1));
        locks.end_read(read).unwrap();
    }

    #[test]
    fn test_foreign_token_is_invalid() {
        let (locks, stats) = manager();
        let other = LockManager::new(SegmentId::new(2));

        let token = other.start_write(None, &stats).unwrap();
        assert!(matches!(locks.end_write(token), Err(Error::InvalidToken(_))));
        other.end_write(token).unwrap();
    }

    #[test]
    fn test_write_times_out_behind_reader() {
        let (locks, stats) = manager();

        let read = locks.start_read(None, &stats).unwrap();
        let result = locks.start_write(Some(Duration::from_millis(20)), &stats);
        assert!(matches!(result, Err(Error::LockFailed(_))));
        assert_eq!(locks.waiting_writers(), 0);
        assert_eq!(stats.snapshot().lock_timeouts, 1);

        // Readers are not held back by the abandoned writer.
        let read2 = locks.start_read(Some(Duration::from_millis(20)), &stats).unwrap();
        locks.end_read(read).unwrap();
        locks.end_read(read2).unwrap();
    }

    #[test]
    fn test_read_times_out_behind_writer() {
        let (locks, stats) = manager();

        let write = locks.start_write(None, &stats).unwrap();
        let result = locks.start_read(Some(Duration::from_millis(20)), &stats);
        assert!(matches!(result, Err(Error::LockFailed(_))));
        locks.end_write(write).unwrap();
    }

    #[test]
    fn test_writer_waits_for_writer() {
        let locks = Arc::new(LockManager::new(SegmentId::new(1)));
        let stats = Arc::new(SegmentStats::new());

        let first = locks.start_write(None, &stats).unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                let token = locks.start_write(None, &stats).unwrap();
                locks.end_write(token).unwrap();
            })
        };

        while locks.waiting_writers() == 0 {
            thread::yield_now();
        }
        assert_eq!(locks.status(), LockStatus::WriteActive);

        locks.end_write(first).unwrap();
        waiter.join().unwrap();

        assert_eq!(locks.status(), LockStatus::Idle);
        assert_eq!(stats.snapshot().write_locks, 2);
        assert!(stats.snapshot().lock_waits >= 1);
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let locks = Arc::new(LockManager::new(SegmentId::new(1)));
        let stats = Arc::new(SegmentStats::new());

        let read = locks.start_read(None, &stats).unwrap();

        let writer = {
            let locks = Arc::clone(&locks);
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                let token = locks.start_write(None, &stats).unwrap();
                locks.end_write(token).unwrap();
            })
        };

        while locks.waiting_writers() == 0 {
            thread::yield_now();
        }

        let late = locks.start_read(Some(Duration::from_millis(20)), &stats);
        assert!(matches!(late, Err(Error::LockFailed(_))));

        locks.end_read(read).unwrap();
        writer.join().unwrap();
        assert_eq!(locks.status(), LockStatus::Idle);
    }
}
