//! Segment identifier type.

use std::fmt;

/// Identifies one incarnation of a shared segment.
///
/// Every segment created by a registry gets a fresh id, so a store that is
/// destroyed and re-created under the same address is distinguishable from
/// its predecessor. Lock tokens carry the id of the segment that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(pub u64);

impl SegmentId {
    /// Create a new SegmentId.
    #[inline]
    pub fn new(id: u64) -> Self {
        SegmentId(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({})", self.0)
    }
}
