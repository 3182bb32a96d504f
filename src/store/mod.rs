//! Store - one handle attached to a named store.
//!
//! A [`Store`] owns no records. It holds a reference to the shared segment
//! and mediates every record, field, lock and search operation against it.
//! Many handles (one per thread is typical) may attach to the same address.
//!
//! # Lifecycle
//! ```text
//! attach ──▶ Attached ──detach / drop──▶ Detached
//!                                            │
//!                    (all handles detached)  ▼
//!                                      Store::destroy
//! ```
//!
//! Record operations live in [`crate::record`], traversal and search in
//! [`crate::query`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::common::{Error, Result, StoreConfig};
use crate::lock::{LockStatus, LockToken, ReadGuard, WriteGuard};
use crate::storage::{Registry, Segment, StatsSnapshot};

/// A handle attached to a named store.
///
/// # Thread Safety
/// `Store` is `Send + Sync`; the usual pattern is one handle per thread, each
/// attached to the same address.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use slotdb::{Registry, Store, StoreConfig};
///
/// let registry = Arc::new(Registry::new());
/// let store = Store::attach_in(&registry, "6700", StoreConfig::new().size_bytes(2_000_000)).unwrap();
///
/// let token = store.start_write().unwrap();
/// let record = store.create_record(2).unwrap();
/// store.set_int_field(record, 0, 12).unwrap();
/// store.end_write(token).unwrap();
///
/// assert_eq!(store.get_int_field(record, 0).unwrap(), 12);
/// store.detach();
/// ```
#[derive(Debug)]
pub struct Store {
    address: String,
    registry: Arc<Registry>,
    segment: Arc<Segment>,
    attached: AtomicBool,
    lock_timeout: Option<Duration>,
    /// Tokens started through this handle and not yet ended.
    held: Mutex<HashSet<LockToken>>,
}

impl Store {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Attach to `address` in the global registry, creating a store of
    /// `size_bytes` if none exists.
    ///
    /// # Errors
    /// - `Error::AttachFailed` for an empty address, or a size below
    ///   `MIN_STORE_SIZE` when creating
    pub fn attach(address: &str, size_bytes: usize) -> Result<Self> {
        Self::attach_with(address, StoreConfig::new().size_bytes(size_bytes))
    }

    /// Attach to `address` in the global registry with explicit settings.
    pub fn attach_with(address: &str, config: StoreConfig) -> Result<Self> {
        Self::attach_in(&Registry::global(), address, config)
    }

    /// Attach to `address` in `registry`.
    pub fn attach_in(registry: &Arc<Registry>, address: &str, config: StoreConfig) -> Result<Self> {
        let segment = registry.attach(address, &config)?;

        Ok(Self {
            address: address.to_string(),
            registry: Arc::clone(registry),
            segment,
            attached: AtomicBool::new(true),
            lock_timeout: config.lock_timeout,
            held: Mutex::new(HashSet::new()),
        })
    }

    /// Release this handle. The store and its records remain.
    ///
    /// Calling this more than once has no further effect. Lock scopes still
    /// open through this handle are ended first.
    pub fn detach(&self) {
        if !self.attached.swap(false, Ordering::AcqRel) {
            return;
        }

        // Taken after the flag flips, so `hold` either sees the detach or
        // has already inserted its token here.
        let held: Vec<LockToken> = self.held.lock().drain().collect();
        for token in held {
            warn!(address = %self.address, token = %token, "releasing lock held at detach");
            if let Err(e) = self.segment.locks().release(token) {
                warn!(token = %token, error = %e, "forced release failed");
            }
        }

        self.registry.detach(&self.segment);
        debug!(address = %self.address, "handle detached");
    }

    /// Destroy the store at `address` in the global registry.
    ///
    /// # Errors
    /// - `Error::DestroyFailed` if no such store exists or handles remain
    pub fn destroy(address: &str) -> Result<()> {
        Registry::global().destroy(address)
    }

    /// Whether this handle is still attached.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Address this handle was attached with.
    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The segment, provided this handle is still attached.
    pub(crate) fn segment(&self) -> Result<&Segment> {
        if self.is_attached() {
            Ok(&self.segment)
        } else {
            Err(Error::Detached)
        }
    }

    // ========================================================================
    // Lock scopes
    // ========================================================================

    /// Start a write scope.
    ///
    /// Blocks until no other read or write scope is active in the store.
    ///
    /// # Errors
    /// - `Error::LockFailed` if the configured lock timeout elapses
    /// - `Error::Detached`
    pub fn start_write(&self) -> Result<LockToken> {
        let segment = self.segment()?;
        let token = segment.locks().start_write(self.lock_timeout, segment.stats())?;
        self.hold(token)
    }

    /// End a write scope.
    ///
    /// # Errors
    /// - `Error::InvalidToken` for a token that is not the active writer
    /// - `Error::Detached`
    pub fn end_write(&self, token: LockToken) -> Result<()> {
        self.segment()?.locks().end_write(token)?;
        self.held.lock().remove(&token);
        Ok(())
    }

    /// Start a read scope.
    ///
    /// Blocks while a write scope is active or a writer is waiting.
    ///
    /// # Errors
    /// - `Error::LockFailed` if the configured lock timeout elapses
    /// - `Error::Detached`
    pub fn start_read(&self) -> Result<LockToken> {
        let segment = self.segment()?;
        let token = segment.locks().start_read(self.lock_timeout, segment.stats())?;
        self.hold(token)
    }

    /// End a read scope.
    ///
    /// # Errors
    /// - `Error::InvalidToken` for a token that is not an active reader
    /// - `Error::Detached`
    pub fn end_read(&self, token: LockToken) -> Result<()> {
        self.segment()?.locks().end_read(token)?;
        self.held.lock().remove(&token);
        Ok(())
    }

    /// Record a granted token as held by this handle.
    ///
    /// A detach that ran while the caller was blocked has already drained
    /// `held`, so the token is handed back instead of being leaked.
    fn hold(&self, token: LockToken) -> Result<LockToken> {
        let mut held = self.held.lock();
        if !self.is_attached() {
            drop(held);
            if let Err(e) = self.segment.locks().release(token) {
                warn!(token = %token, error = %e, "release after detach failed");
            }
            return Err(Error::Detached);
        }
        held.insert(token);
        Ok(token)
    }

    /// Start a read scope that ends when the guard is dropped.
    pub fn read(&self) -> Result<ReadGuard<'_>> {
        self.start_read().map(|token| ReadGuard::new(self, token))
    }

    /// Start a write scope that ends when the guard is dropped.
    pub fn write(&self) -> Result<WriteGuard<'_>> {
        self.start_write().map(|token| WriteGuard::new(self, token))
    }

    /// Current lock state of the store.
    pub fn lock_status(&self) -> Result<LockStatus> {
        Ok(self.segment()?.locks().status())
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Statistics shared by every handle on this store.
    pub fn stats(&self) -> Result<StatsSnapshot> {
        Ok(self.segment()?.stats().snapshot())
    }

    /// Zero the statistics of this store, for every handle attached to it.
    ///
    /// Records and lock state are untouched.
    pub fn reset_stats(&self) -> Result<()> {
        self.segment()?.stats().reset();
        Ok(())
    }

    /// Number of live records.
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.segment()?.record_count())
    }

    /// Bytes of the size budget in use.
    pub fn used_bytes(&self) -> Result<usize> {
        Ok(self.segment()?.used_bytes())
    }

    /// Size budget in bytes, fixed when the store was created.
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.segment()?.capacity_bytes())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::MIN_STORE_SIZE;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::new())
    }

    fn config() -> StoreConfig {
        StoreConfig::new().size_bytes(MIN_STORE_SIZE)
    }

    #[test]
    fn test_attach_and_detach() {
        let registry = registry();
        let store = Store::attach_in(&registry, "db", config()).unwrap();
        assert!(store.is_attached());
        assert_eq!(store.address(), "db");
        assert_eq!(registry.handle_count("db"), 1);

        store.detach();
        assert!(!store.is_attached());
        assert_eq!(registry.handle_count("db"), 0);

        // Second detach is a no-op.
        store.detach();
        assert_eq!(registry.handle_count("db"), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let registry = registry();
        {
            let _store = Store::attach_in(&registry, "db", config()).unwrap();
            assert_eq!(registry.handle_count("db"), 1);
        }
        assert_eq!(registry.handle_count("db"), 0);
        registry.destroy("db").unwrap();
    }

    #[test]
    fn test_detached_handle_fails() {
        let registry = registry();
        let store = Store::attach_in(&registry, "db", config()).unwrap();
        store.detach();

        assert!(matches!(store.start_write(), Err(Error::Detached)));
        assert!(matches!(store.start_read(), Err(Error::Detached)));
        assert!(matches!(store.record_count(), Err(Error::Detached)));
    }

    #[test]
    fn test_detach_releases_held_locks() {
        let registry = registry();
        let a = Store::attach_in(&registry, "db", config()).unwrap();
        let b = Store::attach_in(&registry, "db", config()).unwrap();

        let _token = a.start_write().unwrap();
        assert_eq!(b.lock_status().unwrap(), LockStatus::WriteActive);

        a.detach();
        assert_eq!(b.lock_status().unwrap(), LockStatus::Idle);

        let token = b.start_write().unwrap();
        b.end_write(token).unwrap();
    }

    #[test]
    fn test_detach_while_waiting_for_lock() {
        let registry = registry();
        let holder = Store::attach_in(&registry, "db", config()).unwrap();
        let shared = Arc::new(Store::attach_in(&registry, "db", config()).unwrap());

        let token = holder.start_write().unwrap();

        let waiter = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || shared.start_write())
        };

        std::thread::sleep(Duration::from_millis(50));
        shared.detach();
        holder.end_write(token).unwrap();

        assert!(matches!(waiter.join().unwrap(), Err(Error::Detached)));
        assert_eq!(holder.lock_status().unwrap(), LockStatus::Idle);

        let token = holder.start_write().unwrap();
        holder.end_write(token).unwrap();
    }

    #[test]
    fn test_guards_end_on_drop() {
        let registry = registry();
        let store = Store::attach_in(&registry, "db", config()).unwrap();

        {
            let _r1 = store.read().unwrap();
            let _r2 = store.read().unwrap();
            assert_eq!(store.lock_status().unwrap(), LockStatus::ReadActive(2));
        }
        assert_eq!(store.lock_status().unwrap(), LockStatus::Idle);

        let guard = store.write().unwrap();
        assert_eq!(store.lock_status().unwrap(), LockStatus::WriteActive);
        guard.end().unwrap();
        assert_eq!(store.lock_status().unwrap(), LockStatus::Idle);
    }

    #[test]
    fn test_lock_timeout_from_config() {
        let registry = registry();
        let holder = Store::attach_in(&registry, "db", config()).unwrap();
        let waiter = Store::attach_in(
            &registry,
            "db",
            config().lock_timeout(Some(Duration::from_millis(20))),
        )
        .unwrap();

        let token = holder.start_write().unwrap();
        assert!(matches!(waiter.start_read(), Err(Error::LockFailed(_))));
        assert!(matches!(waiter.start_write(), Err(Error::LockFailed(_))));
        holder.end_write(token).unwrap();

        assert_eq!(holder.stats().unwrap().lock_timeouts, 2);
    }

    #[test]
    fn test_reset_stats() {
        let registry = registry();
        let a = Store::attach_in(&registry, "db", config()).unwrap();
        let b = Store::attach_in(&registry, "db", config()).unwrap();

        let token = a.start_write().unwrap();
        a.end_write(token).unwrap();
        let token = b.start_read().unwrap();
        b.end_read(token).unwrap();
        assert_eq!(b.stats().unwrap().write_locks, 1);

        a.reset_stats().unwrap();
        assert_eq!(b.stats().unwrap(), StatsSnapshot::default());

        a.detach();
        assert!(matches!(a.reset_stats(), Err(Error::Detached)));
    }

    #[test]
    fn test_handles_from_other_registry_are_rejected() {
        let a = Store::attach_in(&registry(), "db", config()).unwrap();
        let b = Store::attach_in(&registry(), "db", config()).unwrap();

        let token = a.start_write().unwrap();
        let other = b.start_write().unwrap();

        assert!(matches!(b.end_write(token), Err(Error::InvalidToken(_))));
        assert_eq!(b.lock_status().unwrap(), LockStatus::WriteActive);

        b.end_write(other).unwrap();
        a.end_write(token).unwrap();
    }

    #[test]
    fn test_token_from_other_store_is_rejected() {
        let registry = registry();
        let a = Store::attach_in(&registry, "a", config()).unwrap();
        let b = Store::attach_in(&registry, "b", config()).unwrap();

        let token = a.start_write().unwrap();
        assert!(matches!(b.end_write(token), Err(Error::InvalidToken(_))));
        a.end_write(token).unwrap();
    }
}
