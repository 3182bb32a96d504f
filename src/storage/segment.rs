//! Segment - the shared region behind a named store.
//!
//! The [`Segment`] is the storage backend every [`Store`](crate::Store)
//! handle talks to. It provides exactly the primitives the client layer
//! needs:
//! - Record slot allocation (indexed or raw) and release
//! - Field slot reads and writes of already-encoded values
//! - First/next iteration and predicate lookup over slots
//! - The store-wide [`LockManager`]
//!
//! Each primitive is atomic on its own. Grouping several primitives into one
//! consistent unit is what the lock manager's scopes are for.

use std::sync::atomic::Ordering;

use parking_lot::RwLock;
use tracing::trace;

use super::slot::{record_words, value_words, RecordBody, Slot};
use super::SegmentStats;
use crate::codec::{EncodedValue, FieldType};
use crate::common::config::WORD_SIZE;
use crate::common::{Error, RecordId, Result, SegmentId, StoreConfig};
use crate::lock::LockManager;

/// How a field write treats the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Replace whatever is stored.
    Overwrite,
    /// Only write into a null field.
    SetNew,
}

/// Slot table plus allocation bookkeeping.
#[derive(Debug, Default)]
struct SlotTable {
    /// All slots ever allocated; vacant slots stay in place.
    slots: Vec<Slot>,
    /// Vacant slot indexes (LIFO).
    free_list: Vec<u32>,
    /// Words charged against the budget.
    used_words: usize,
    /// Number of live records.
    live: usize,
}

impl SlotTable {
    fn slot(&self, id: RecordId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    fn record(&self, id: RecordId) -> Option<&RecordBody> {
        self.slot(id).and_then(|slot| slot.get(id))
    }

    fn record_mut(&mut self, id: RecordId) -> Option<&mut RecordBody> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.get_mut(id))
    }

    /// Live records from slot `start` onward, in slot order.
    fn live_from(&self, start: usize) -> impl Iterator<Item = (RecordId, &RecordBody)> {
        self.slots
            .iter()
            .enumerate()
            .skip(start)
            .filter_map(|(index, slot)| {
                slot.body()
                    .map(|body| (RecordId::new(index as u32, slot.generation()), body))
            })
    }
}

/// Slot index where a traversal resuming after `after` starts.
#[inline]
fn resume_index(after: Option<RecordId>) -> usize {
    after.map_or(0, |id| id.index() + 1)
}

/// One shared segment.
///
/// # Thread Safety
/// - `table`: `RwLock` - reads and scans share, allocation and writes exclude
/// - `locks`: internal `Mutex` + `Condvar`s
/// - `stats`: atomic counters
#[derive(Debug)]
pub struct Segment {
    id: SegmentId,
    address: String,
    capacity_words: usize,
    max_fields: usize,
    table: RwLock<SlotTable>,
    locks: LockManager,
    stats: SegmentStats,
}

impl Segment {
    /// Create an empty segment sized by `config`.
    pub(crate) fn new(id: SegmentId, address: &str, config: &StoreConfig) -> Self {
        Self {
            id,
            address: address.to_string(),
            capacity_words: config.size_bytes / WORD_SIZE,
            max_fields: config.max_fields,
            table: RwLock::new(SlotTable::default()),
            locks: LockManager::new(id),
            stats: SegmentStats::new(),
        }
    }

    // ========================================================================
    // Record slots
    // ========================================================================

    /// Allocate a record with `field_count` null fields.
    ///
    /// # Errors
    /// - `Error::CreateFailed` if the field count exceeds the limit or the
    ///   size budget is exhausted
    pub(crate) fn allocate_record(&self, field_count: usize, indexed: bool) -> Result<RecordId> {
        if field_count > self.max_fields {
            return Err(Error::CreateFailed(format!(
                "field count {} exceeds limit {}",
                field_count, self.max_fields
            )));
        }

        let words = record_words(field_count);
        let mut table = self.table.write();

        if table.used_words + words > self.capacity_words {
            return Err(Error::CreateFailed(format!(
                "store {:?} is full ({} of {} bytes used)",
                self.address,
                table.used_words * WORD_SIZE,
                self.capacity_words * WORD_SIZE
            )));
        }

        let index = match table.free_list.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(table.slots.len())
                    .map_err(|_| Error::CreateFailed("slot table exhausted".to_string()))?;
                table.slots.push(Slot::default());
                index
            }
        };

        let generation = table.slots[index as usize].occupy(field_count, indexed);
        table.used_words += words;
        table.live += 1;
        drop(table);

        let id = RecordId::new(index, generation);
        self.stats.records_created.fetch_add(1, Ordering::Relaxed);
        trace!(segment = %self.id, record = %id, field_count, indexed, "record allocated");

        Ok(id)
    }

    /// Free a record slot.
    ///
    /// # Errors
    /// - `Error::DeleteFailed` if `id` does not name a live record
    pub(crate) fn free_record(&self, id: RecordId) -> Result<()> {
        let mut table = self.table.write();

        if table.record(id).is_none() {
            return Err(Error::DeleteFailed(id));
        }

        let words = table.slots[id.index()].vacate();
        table.used_words -= words;
        table.live -= 1;
        table.free_list.push(id.slot());
        drop(table);

        self.stats.records_deleted.fetch_add(1, Ordering::Relaxed);
        trace!(segment = %self.id, record = %id, "record freed");

        Ok(())
    }

    /// Field count of a live record.
    ///
    /// # Errors
    /// - `Error::StaleRecord` if `id` does not name a live record
    pub(crate) fn record_len(&self, id: RecordId) -> Result<usize> {
        let table = self.table.read();
        table
            .record(id)
            .map(|body| body.fields.len())
            .ok_or(Error::StaleRecord(id))
    }

    /// Whether the record was created indexed.
    pub(crate) fn is_indexed(&self, id: RecordId) -> Result<bool> {
        let table = self.table.read();
        table
            .record(id)
            .map(|body| body.indexed)
            .ok_or(Error::StaleRecord(id))
    }

    // ========================================================================
    // Field slots
    // ========================================================================

    /// Run `f` on a field value while the slot table is read-locked.
    ///
    /// # Errors
    /// - `Error::StaleRecord` if `id` does not name a live record
    /// - `Error::OutOfRange` if `field` is not below the field count
    pub(crate) fn with_field<R>(
        &self,
        id: RecordId,
        field: usize,
        f: impl FnOnce(&EncodedValue) -> R,
    ) -> Result<R> {
        let table = self.table.read();
        let body = table.record(id).ok_or(Error::StaleRecord(id))?;
        let value = body.fields.get(field).ok_or(Error::OutOfRange {
            field,
            field_count: body.fields.len(),
        })?;
        Ok(f(value))
    }

    /// Copy out a field value.
    pub(crate) fn read_field(&self, id: RecordId, field: usize) -> Result<EncodedValue> {
        self.with_field(id, field, EncodedValue::clone)
    }

    /// Type of a field value.
    pub(crate) fn field_type(&self, id: RecordId, field: usize) -> Result<FieldType> {
        self.with_field(id, field, EncodedValue::field_type)
    }

    /// Store an encoded value into a field.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if `field` is not below the field count
    /// - `Error::AlreadySet` for `WriteMode::SetNew` on a non-null field
    /// - `Error::SetFailed` for a stale record, an illegal value, or an
    ///   exhausted size budget
    pub(crate) fn write_field(
        &self,
        id: RecordId,
        field: usize,
        value: EncodedValue,
        mode: WriteMode,
    ) -> Result<()> {
        let set_failed = |reason: &str| Error::SetFailed {
            record: id,
            field,
            reason: reason.to_string(),
        };

        if value.field_type() == FieldType::Illegal {
            return Err(set_failed("illegal values cannot be stored"));
        }

        let mut table = self.table.write();
        let used_words = table.used_words;

        let body = table
            .record_mut(id)
            .ok_or_else(|| set_failed("record is no longer live"))?;
        let field_count = body.fields.len();
        let slot = body
            .fields
            .get_mut(field)
            .ok_or(Error::OutOfRange { field, field_count })?;

        if mode == WriteMode::SetNew && !slot.is_null() {
            return Err(Error::AlreadySet { record: id, field });
        }

        let old_words = value_words(slot);
        let new_words = value_words(&value);
        let next_used = used_words - old_words + new_words;
        if next_used > self.capacity_words {
            return Err(set_failed("store is full"));
        }

        *slot = value;
        table.used_words = next_used;
        drop(table);

        self.stats.field_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    // ========================================================================
    // Iteration and lookup
    // ========================================================================

    /// First live record after `after` (or from the start), indexed or raw.
    ///
    /// `after` only supplies a position: it may name a record that has since
    /// been deleted, in which case iteration continues with the next live
    /// slot.
    pub(crate) fn next_live(&self, after: Option<RecordId>) -> Option<RecordId> {
        let table = self.table.read();
        let next = table.live_from(resume_index(after)).next();
        next.map(|(id, _)| id)
    }

    /// First indexed record after `after` whose fields satisfy `pred`.
    pub(crate) fn find_indexed(
        &self,
        after: Option<RecordId>,
        pred: impl Fn(&[EncodedValue]) -> bool,
    ) -> Option<RecordId> {
        let table = self.table.read();
        let found = table
            .live_from(resume_index(after))
            .find(|(_, body)| body.indexed && pred(&body.fields));
        found.map(|(id, _)| id)
    }

    /// All indexed records whose fields satisfy `pred`, in slot order.
    pub(crate) fn collect_indexed(&self, pred: impl Fn(&[EncodedValue]) -> bool) -> Vec<RecordId> {
        let table = self.table.read();
        table
            .live_from(0)
            .filter(|(_, body)| body.indexed && pred(&body.fields))
            .map(|(id, _)| id)
            .collect()
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Segment id.
    #[inline]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Address the segment is registered under.
    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The segment's lock manager.
    #[inline]
    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Segment statistics.
    #[inline]
    pub fn stats(&self) -> &SegmentStats {
        &self.stats
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        self.table.read().live
    }

    /// Bytes charged against the size budget.
    pub fn used_bytes(&self) -> usize {
        self.table.read().used_words * WORD_SIZE
    }

    /// Size budget in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_words * WORD_SIZE
    }

    /// Largest field count a record may have.
    pub fn max_fields(&self) -> usize {
        self.max_fields
    }

    /// Bytes a record with `field_count` null fields is charged.
    pub fn record_footprint(field_count: usize) -> usize {
        record_words(field_count) * WORD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_bytes, encode_int};
    use crate::common::config::MIN_STORE_SIZE;

    fn segment(size: usize) -> Segment {
        Segment::new(
            SegmentId::new(1),
            "test",
            &StoreConfig::new().size_bytes(size).max_fields(64),
        )
    }

    #[test]
    fn test_allocate_and_free() {
        let seg = segment(MIN_STORE_SIZE);

        let id = seg.allocate_record(3, true).unwrap();
        assert_eq!(seg.record_len(id).unwrap(), 3);
        assert_eq!(seg.record_count(), 1);
        assert_eq!(seg.used_bytes(), Segment::record_footprint(3));

        seg.free_record(id).unwrap();
        assert_eq!(seg.record_count(), 0);
        assert_eq!(seg.used_bytes(), 0);
        assert!(matches!(seg.free_record(id), Err(Error::DeleteFailed(_))));
    }

    #[test]
    fn test_free_slot_is_reused_with_new_generation() {
        let seg = segment(MIN_STORE_SIZE);

        let first = seg.allocate_record(1, true).unwrap();
        seg.free_record(first).unwrap();
        let second = seg.allocate_record(1, true).unwrap();

        assert_eq!(first.slot(), second.slot());
        assert_ne!(first, second);
        assert!(matches!(seg.record_len(first), Err(Error::StaleRecord(_))));
    }

    #[test]
    fn test_field_limit() {
        let seg = segment(MIN_STORE_SIZE);
        assert!(matches!(
            seg.allocate_record(65, true),
            Err(Error::CreateFailed(_))
        ));
    }

    #[test]
    fn test_budget_exhaustion() {
        let seg = segment(MIN_STORE_SIZE);

        // Each 60-field record costs 64 words = 512 bytes; 8 fit in 4KB.
        for _ in 0..8 {
            seg.allocate_record(60, false).unwrap();
        }
        assert!(matches!(
            seg.allocate_record(60, false),
            Err(Error::CreateFailed(_))
        ));
    }

    #[test]
    fn test_write_respects_budget() {
        let seg = segment(MIN_STORE_SIZE);
        let id = seg.allocate_record(1, true).unwrap();

        let huge = encode_bytes(vec![b'x'; MIN_STORE_SIZE]);
        assert!(matches!(
            seg.write_field(id, 0, huge, WriteMode::Overwrite),
            Err(Error::SetFailed { .. })
        ));
        // Failed write leaves the field untouched.
        assert!(seg.read_field(id, 0).unwrap().is_null());
    }

    #[test]
    fn test_write_modes() {
        let seg = segment(MIN_STORE_SIZE);
        let id = seg.allocate_record(2, true).unwrap();

        seg.write_field(id, 0, encode_int(1), WriteMode::SetNew)
            .unwrap();
        assert!(matches!(
            seg.write_field(id, 0, encode_int(2), WriteMode::SetNew),
            Err(Error::AlreadySet { field: 0, .. })
        ));
        seg.write_field(id, 0, encode_int(3), WriteMode::Overwrite)
            .unwrap();
        assert_eq!(seg.read_field(id, 0).unwrap(), encode_int(3));

        assert!(matches!(
            seg.write_field(id, 2, encode_int(1), WriteMode::Overwrite),
            Err(Error::OutOfRange {
                field: 2,
                field_count: 2
            })
        ));
        assert!(matches!(
            seg.write_field(id, 1, EncodedValue::Illegal, WriteMode::Overwrite),
            Err(Error::SetFailed { .. })
        ));
    }

    #[test]
    fn test_next_live_skips_vacant_slots() {
        let seg = segment(MIN_STORE_SIZE);
        let a = seg.allocate_record(1, true).unwrap();
        let b = seg.allocate_record(1, false).unwrap();
        let c = seg.allocate_record(1, true).unwrap();

        seg.free_record(b).unwrap();

        assert_eq!(seg.next_live(None), Some(a));
        assert_eq!(seg.next_live(Some(a)), Some(c));
        // Resuming from the deleted record continues positionally.
        assert_eq!(seg.next_live(Some(b)), Some(c));
        assert_eq!(seg.next_live(Some(c)), None);
    }

    #[test]
    fn test_find_indexed_ignores_raw_records() {
        let seg = segment(MIN_STORE_SIZE);
        let raw = seg.allocate_record(1, false).unwrap();
        let indexed = seg.allocate_record(1, true).unwrap();
        for id in [raw, indexed] {
            seg.write_field(id, 0, encode_int(7), WriteMode::Overwrite)
                .unwrap();
        }

        let is_seven = |fields: &[EncodedValue]| fields[0] == encode_int(7);
        assert_eq!(seg.find_indexed(None, is_seven), Some(indexed));
        assert_eq!(seg.find_indexed(Some(indexed), is_seven), None);
        assert_eq!(seg.collect_indexed(is_seven), vec![indexed]);
    }
}
