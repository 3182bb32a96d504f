//! Error types for slotdb.

use thiserror::Error;

use crate::codec::FieldType;
use crate::common::RecordId;
use crate::lock::LockToken;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in slotdb.
///
/// Every backend primitive that can fail reports one of these kinds. There is
/// no "zero on error": a failed operation never looks like a successful one.
///
/// [`Error::EndOfStore`] is not a fault. It terminates traversal and search
/// loops; use [`Error::is_end_of_store`] to tell it apart from real failures.
#[derive(Debug, Error)]
pub enum Error {
    /// The named store could not be created or joined.
    #[error("could not attach store {address:?}: {reason}")]
    AttachFailed {
        /// Address that was requested.
        address: String,
        /// Why the attach was refused.
        reason: String,
    },

    /// The named store could not be destroyed.
    #[error("could not destroy store {address:?}: {reason}")]
    DestroyFailed {
        /// Address that was requested.
        address: String,
        /// Why the destroy was refused.
        reason: String,
    },

    /// A record could not be allocated.
    #[error("could not create record: {0}")]
    CreateFailed(String),

    /// The record does not exist (already deleted or never belonged here).
    #[error("could not delete {0}")]
    DeleteFailed(RecordId),

    /// A field write was refused.
    #[error("could not set field {field} of {record}: {reason}")]
    SetFailed {
        /// Target record.
        record: RecordId,
        /// Target field index.
        field: usize,
        /// Why the write was refused.
        reason: String,
    },

    /// A set-once write hit a field that already holds a value.
    #[error("field {field} of {record} is already set")]
    AlreadySet {
        /// Target record.
        record: RecordId,
        /// Target field index.
        field: usize,
    },

    /// Field index is not below the record's field count.
    #[error("field index {field} out of range for record with {field_count} fields")]
    OutOfRange {
        /// Requested field index.
        field: usize,
        /// Field count of the record.
        field_count: usize,
    },

    /// The stored value's type is not the one that was asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the caller asked for.
        expected: FieldType,
        /// Type actually stored.
        found: FieldType,
    },

    /// Traversal or search has no further records.
    #[error("end of store")]
    EndOfStore,

    /// A lock could not be granted.
    #[error("lock failed: {0}")]
    LockFailed(String),

    /// The token is not an active token of the matching kind in this store.
    #[error("invalid lock token {0}")]
    InvalidToken(LockToken),

    /// The record handle refers to a deleted record.
    #[error("{0} is no longer live")]
    StaleRecord(RecordId),

    /// The store handle has been detached.
    #[error("store handle is detached")]
    Detached,

    /// A value could not be encoded (e.g. out of the type's range).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A serialized field could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns true for the traversal/search terminator.
    #[inline]
    pub fn is_end_of_store(&self) -> bool {
        matches!(self, Error::EndOfStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfRange {
            field: 5,
            field_count: 5,
        };
        assert_eq!(
            format!("{}", err),
            "field index 5 out of range for record with 5 fields"
        );

        let err = Error::TypeMismatch {
            expected: FieldType::Int,
            found: FieldType::Str,
        };
        assert_eq!(format!("{}", err), "type mismatch: expected int, found str");

        let err = Error::AlreadySet {
            record: RecordId::new(3, 1),
            field: 1,
        };
        assert_eq!(format!("{}", err), "field 1 of Record(3#1) is already set");
    }

    #[test]
    fn test_end_of_store_is_distinguishable() {
        assert!(Error::EndOfStore.is_end_of_store());
        assert!(!Error::Detached.is_end_of_store());
        assert!(!Error::CreateFailed("full".into()).is_end_of_store());
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
