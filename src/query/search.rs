//! Resumable predicate search over indexed records.
//!
//! A search compares one field of every indexed record against a value using
//! [`compare`](crate::codec::compare): values of different types order by
//! type tag, so `Less` against an integer also matches null fields. Records
//! whose field count does not reach the searched field never match.
//!
//! Matches come back in slot order, which is deterministic for a fixed store
//! state. Pass the previous match to continue after it.

use bytes::Bytes;

use super::Condition;
use crate::codec::{compare, encode_bytes, encode_double, encode_int, EncodedValue};
use crate::common::{Error, Result};
use crate::record::Record;
use crate::store::Store;

/// Whether `fields[field]` satisfies `condition` against `value`.
pub(crate) fn field_matches(
    fields: &[EncodedValue],
    field: usize,
    condition: Condition,
    value: &EncodedValue,
) -> bool {
    fields
        .get(field)
        .is_some_and(|stored| condition.matches(compare(stored, value)))
}

impl Store {
    /// Find the next indexed record whose `field` satisfies `condition`.
    ///
    /// `previous` is `None` to start from the beginning, or the last match to
    /// continue after it.
    ///
    /// # Errors
    /// - `Error::EndOfStore` if no further record matches
    pub fn find_record(
        &self,
        field: usize,
        condition: Condition,
        value: &EncodedValue,
        previous: Option<Record>,
    ) -> Result<Record> {
        let segment = self.segment()?;
        if let Some(prev) = previous {
            if prev.segment() != segment.id() {
                return Err(Error::StaleRecord(prev.id()));
            }
        }

        segment
            .find_indexed(previous.map(|r| r.id()), |fields| {
                field_matches(fields, field, condition, value)
            })
            .map(|id| Record::new(segment.id(), id))
            .ok_or(Error::EndOfStore)
    }

    /// [`find_record`](Self::find_record) against an integer.
    pub fn find_record_int(
        &self,
        field: usize,
        condition: Condition,
        value: i64,
        previous: Option<Record>,
    ) -> Result<Record> {
        self.find_record(field, condition, &encode_int(value), previous)
    }

    /// [`find_record`](Self::find_record) against a double.
    pub fn find_record_double(
        &self,
        field: usize,
        condition: Condition,
        value: f64,
        previous: Option<Record>,
    ) -> Result<Record> {
        self.find_record(field, condition, &encode_double(value), previous)
    }

    /// [`find_record`](Self::find_record) against a byte string.
    pub fn find_record_bytes(
        &self,
        field: usize,
        condition: Condition,
        value: impl Into<Bytes>,
        previous: Option<Record>,
    ) -> Result<Record> {
        self.find_record(field, condition, &encode_bytes(value), previous)
    }
}
