//! RAII guards for lock scopes.
//!
//! These guards wrap a [`LockToken`] issued by a [`Store`]:
//! - [`ReadGuard`] - Shared read scope (multiple allowed)
//! - [`WriteGuard`] - Exclusive write scope
//!
//! Both guards end their scope when dropped. Call `end()` instead to observe
//! the result of ending it.

use tracing::warn;

use super::LockToken;
use crate::common::Result;
use crate::store::Store;

/// Guard for a read scope.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use slotdb::{Registry, Store, StoreConfig};
///
/// let registry = Arc::new(Registry::new());
/// let store = Store::attach_in(&registry, "guards", StoreConfig::default()).unwrap();
///
/// let guard = store.read().unwrap();
/// let _ = store.first_record();
/// guard.end().unwrap();
/// ```
#[derive(Debug)]
pub struct ReadGuard<'a> {
    store: &'a Store,
    token: LockToken,
    ended: bool,
}

impl<'a> ReadGuard<'a> {
    /// Called by `Store::read()`.
    pub(crate) fn new(store: &'a Store, token: LockToken) -> Self {
        Self {
            store,
            token,
            ended: false,
        }
    }

    /// Token backing this scope.
    #[inline]
    pub fn token(&self) -> LockToken {
        self.token
    }

    /// End the scope now.
    ///
    /// # Errors
    /// - `Error::Detached` if the store was detached while the scope was open
    pub fn end(mut self) -> Result<()> {
        self.ended = true;
        self.store.end_read(self.token)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(e) = self.store.end_read(self.token) {
            warn!(token = %self.token, error = %e, "failed to end read scope on drop");
        }
    }
}

/// Guard for a write scope.
///
/// Only one write scope can be active per store at a time.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use slotdb::{Registry, Store, StoreConfig};
///
/// let registry = Arc::new(Registry::new());
/// let store = Store::attach_in(&registry, "guards", StoreConfig::default()).unwrap();
///
/// {
///     let _guard = store.write().unwrap();
///     let record = store.create_record(1).unwrap();
///     store.set_int_field(record, 0, 7).unwrap();
/// } // scope ends here
/// ```
#[derive(Debug)]
pub struct WriteGuard<'a> {
    store: &'a Store,
    token: LockToken,
    ended: bool,
}

impl<'a> WriteGuard<'a> {
    /// Called by `Store::write()`.
    pub(crate) fn new(store: &'a Store, token: LockToken) -> Self {
        Self {
            store,
            token,
            ended: false,
        }
    }

    /// Token backing this scope.
    #[inline]
    pub fn token(&self) -> LockToken {
        self.token
    }

    /// End the scope now.
    ///
    /// # Errors
    /// - `Error::Detached` if the store was detached while the scope was open
    pub fn end(mut self) -> Result<()> {
        self.ended = true;
        self.store.end_write(self.token)
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(e) = self.store.end_write(self.token) {
            warn!(token = %self.token, error = %e, "failed to end write scope on drop");
        }
    }
}
