//! Record operations.
//!
//! A [`Record`] is a `Copy` identifier for a fixed-length record inside one
//! store. All operations go through the [`Store`] it was created in:
//!
//! ```text
//! create_record / create_raw_record ──▶ Record ──▶ set_* / get_* ──▶ delete_record
//! ```
//!
//! Fields start out null. `set_field` overwrites, `set_new_field` only writes
//! into a null field. `get_field` never fails; a bad index or a deleted record
//! reads as `EncodedValue::Illegal`.

use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{
    decode_blob, decode_bytes_shared, decode_double, decode_int, encode_blob, encode_bytes,
    encode_double, encode_int, EncodedValue, FieldType,
};
use crate::common::{Error, RecordId, Result, SegmentId};
use crate::storage::{Segment, WriteMode};
use crate::store::Store;

/// Blob type attached to serialized fields.
pub const SERIALIZED_BLOB_TYPE: &[u8] = b"application/cbor";

/// Handle to a record in a store.
///
/// A `Record` does not own anything. Once the record is deleted, or the store
/// is detached, operations through the handle fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    segment: SegmentId,
    id: RecordId,
}

impl Record {
    pub(crate) fn new(segment: SegmentId, id: RecordId) -> Self {
        Self { segment, id }
    }

    /// Identifier of the record within its store.
    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Segment of the store the record was created in.
    #[inline]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Store {
    /// Segment plus record id, checking the record belongs to this store.
    fn locate(&self, record: Record) -> Result<(&Segment, RecordId)> {
        let segment = self.segment()?;
        if record.segment != segment.id() {
            return Err(Error::StaleRecord(record.id));
        }
        Ok((segment, record.id))
    }

    // ========================================================================
    // Create / delete
    // ========================================================================

    /// Create an indexed record with `field_count` null fields.
    ///
    /// # Errors
    /// - `Error::CreateFailed` if the field count is above the store's limit
    ///   or the size budget is exhausted
    pub fn create_record(&self, field_count: usize) -> Result<Record> {
        self.create(field_count, true)
    }

    /// Create a raw record: like [`create_record`](Self::create_record), but
    /// invisible to search and queries.
    pub fn create_raw_record(&self, field_count: usize) -> Result<Record> {
        self.create(field_count, false)
    }

    fn create(&self, field_count: usize, indexed: bool) -> Result<Record> {
        let segment = self.segment()?;
        let id = segment.allocate_record(field_count, indexed)?;
        Ok(Record::new(segment.id(), id))
    }

    /// Delete a record and invalidate every handle to it.
    ///
    /// # Errors
    /// - `Error::DeleteFailed` if the record was already deleted or belongs
    ///   to another store
    pub fn delete_record(&self, record: Record) -> Result<()> {
        let (segment, id) = self.locate(record).map_err(|e| match e {
            Error::StaleRecord(id) => Error::DeleteFailed(id),
            other => other,
        })?;
        segment.free_record(id)
    }

    /// Number of fields in a record.
    pub fn record_len(&self, record: Record) -> Result<usize> {
        let (segment, id) = self.locate(record)?;
        segment.record_len(id)
    }

    /// Whether a record is visible to search.
    pub fn is_indexed(&self, record: Record) -> Result<bool> {
        let (segment, id) = self.locate(record)?;
        segment.is_indexed(id)
    }

    // ========================================================================
    // Generic field access
    // ========================================================================

    /// Store an encoded value, replacing whatever the field held.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if `field` is not below the field count
    /// - `Error::SetFailed` for a deleted or foreign record, an illegal
    ///   value, or an exhausted size budget
    pub fn set_field(&self, record: Record, field: usize, value: EncodedValue) -> Result<()> {
        self.write_value(record, field, value, WriteMode::Overwrite)
    }

    /// Store an encoded value into a field that is still null.
    ///
    /// # Errors
    /// - `Error::AlreadySet` if the field already holds a value
    /// - otherwise as [`set_field`](Self::set_field)
    pub fn set_new_field(&self, record: Record, field: usize, value: EncodedValue) -> Result<()> {
        self.write_value(record, field, value, WriteMode::SetNew)
    }

    fn write_value(&self, record: Record, field: usize, value: EncodedValue, mode: WriteMode) -> Result<()> {
        let (segment, id) = self.locate(record).map_err(|e| match e {
            Error::StaleRecord(id) => Error::SetFailed {
                record: id,
                field,
                reason: "record is no longer live".to_string(),
            },
            other => other,
        })?;
        segment.write_field(id, field, value, mode)
    }

    /// Read a field.
    ///
    /// Returns `EncodedValue::Illegal` if the field cannot be read.
    pub fn get_field(&self, record: Record, field: usize) -> EncodedValue {
        self.with_field(record, field, EncodedValue::clone)
            .unwrap_or(EncodedValue::Illegal)
    }

    /// Type of a field; `FieldType::Illegal` if the field cannot be read.
    pub fn get_field_type(&self, record: Record, field: usize) -> FieldType {
        self.with_field(record, field, EncodedValue::field_type)
            .unwrap_or(FieldType::Illegal)
    }

    /// Run `f` on a field value without copying it.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if `field` is not below the field count
    /// - `Error::StaleRecord` for a deleted or foreign record
    pub fn with_field<R>(
        &self,
        record: Record,
        field: usize,
        f: impl FnOnce(&EncodedValue) -> R,
    ) -> Result<R> {
        let (segment, id) = self.locate(record)?;
        segment.with_field(id, field, f)
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Encode and store an integer.
    pub fn set_int_field(&self, record: Record, field: usize, value: i64) -> Result<()> {
        self.set_field(record, field, encode_int(value))
    }

    /// Encode and store a double.
    pub fn set_double_field(&self, record: Record, field: usize, value: f64) -> Result<()> {
        self.set_field(record, field, encode_double(value))
    }

    /// Encode and store a byte string.
    pub fn set_bytes_field(&self, record: Record, field: usize, value: impl Into<Bytes>) -> Result<()> {
        self.set_field(record, field, encode_bytes(value))
    }

    /// Read an integer field.
    ///
    /// # Errors
    /// - `Error::TypeMismatch` if the field does not hold an integer
    /// - as [`with_field`](Self::with_field)
    pub fn get_int_field(&self, record: Record, field: usize) -> Result<i64> {
        self.with_field(record, field, decode_int)?
    }

    /// Read a double field.
    pub fn get_double_field(&self, record: Record, field: usize) -> Result<f64> {
        self.with_field(record, field, decode_double)?
    }

    /// Read a byte string field. The returned buffer shares the stored bytes.
    pub fn get_bytes_field(&self, record: Record, field: usize) -> Result<Bytes> {
        self.with_field(record, field, decode_bytes_shared)?
    }

    // ========================================================================
    // Serialized fields
    // ========================================================================

    /// Serialize `value` as CBOR and store it as a blob.
    ///
    /// # Errors
    /// - `Error::Serialization` if `value` cannot be serialized
    /// - as [`set_field`](Self::set_field)
    pub fn set_serialized_field<T: Serialize>(&self, record: Record, field: usize, value: &T) -> Result<()> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let blob = encode_blob(buf, Some(Bytes::from_static(SERIALIZED_BLOB_TYPE)));
        self.set_field(record, field, blob)
    }

    /// Read back a value stored by
    /// [`set_serialized_field`](Self::set_serialized_field).
    ///
    /// # Errors
    /// - `Error::TypeMismatch` if the field does not hold a blob
    /// - `Error::Serialization` if the blob is not CBOR for a `T`
    pub fn get_serialized_field<T: DeserializeOwned>(&self, record: Record, field: usize) -> Result<T> {
        self.with_field(record, field, |value| {
            let (data, blob_type) = decode_blob(value)?;
            if blob_type != Some(SERIALIZED_BLOB_TYPE) {
                return Err(Error::Serialization(format!(
                    "blob type {:?} is not {:?}",
                    blob_type.map(String::from_utf8_lossy),
                    String::from_utf8_lossy(SERIALIZED_BLOB_TYPE)
                )));
            }
            ciborium::de::from_reader(data).map_err(|e| Error::Serialization(e.to_string()))
        })?
    }
}
