//! Lock tokens.

use std::fmt;

use crate::common::SegmentId;

/// Kind of scope a token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// Shared read scope.
    Read,
    /// Exclusive write scope.
    Write,
}

/// Opaque proof of an active read or write scope.
///
/// A token is only meaningful to the store that issued it: it names the
/// issuing segment, a per-segment sequence number, and the scope kind.
/// Ending a token twice, ending it with the wrong operation, or presenting it
/// to another store fails with `Error::InvalidToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken {
    segment: SegmentId,
    id: u64,
    kind: LockKind,
}

impl LockToken {
    pub(crate) fn new(segment: SegmentId, id: u64, kind: LockKind) -> Self {
        Self { segment, id, kind }
    }

    /// The scope kind.
    #[inline]
    pub fn kind(&self) -> LockKind {
        self.kind
    }

    /// The issuing segment.
    #[inline]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    /// The raw sequence number, unique within the issuing segment.
    #[inline]
    pub fn as_raw(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LockKind::Read => "Read",
            LockKind::Write => "Write",
        };
        write!(f, "{}({}@{})", kind, self.id, self.segment)
    }
}
