//! Lock layer - store-wide read/write scopes.
//!
//! - [`LockManager`] - Per-segment state machine issuing [`LockToken`]s
//! - [`ReadGuard`] / [`WriteGuard`] - RAII wrappers ending a scope on drop

mod guard;
mod lock_manager;
mod token;

pub use guard::{ReadGuard, WriteGuard};
pub use lock_manager::{LockManager, LockStatus};
pub use token::{LockKind, LockToken};
