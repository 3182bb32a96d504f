//! Record identifier type.

use std::fmt;

/// Identifies a record slot inside one store.
///
/// A record id is a slot index paired with the slot's generation. Deleting a
/// record bumps its slot's generation, so every id handed out for the old
/// record stops matching and is reported as stale instead of silently
/// aliasing whatever record reuses the slot.
///
/// # Example
/// ```
/// use slotdb::RecordId;
///
/// let id = RecordId::new(7, 2);
/// assert_eq!(id.slot(), 7);
/// assert_eq!(id.generation(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    slot: u32,
    generation: u32,
}

impl RecordId {
    /// Create a new RecordId.
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        RecordId { slot, generation }
    }

    /// Slot index within the store's slot table.
    #[inline]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation of the slot when this record was created.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Slot index usable for indexing a `Vec`.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}#{})", self.slot, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_new() {
        let id = RecordId::new(42, 3);
        assert_eq!(id.slot(), 42);
        assert_eq!(id.generation(), 3);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn test_record_id_generation_distinguishes() {
        assert_ne!(RecordId::new(1, 0), RecordId::new(1, 1));
    }

    #[test]
    fn test_record_id_ordering() {
        assert!(RecordId::new(1, 9) < RecordId::new(2, 0));
        assert!(RecordId::new(5, 1) > RecordId::new(5, 0));
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(format!("{}", RecordId::new(42, 0)), "Record(42#0)");
    }
}
