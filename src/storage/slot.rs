//! Slot - one entry of a segment's slot table.
//!
//! A [`Slot`] either holds a live record or is vacant. Its generation
//! counter advances every time the record in it is freed, which is what
//! makes stale [`RecordId`]s detectable.

use crate::codec::EncodedValue;
use crate::common::config::{words_for, RECORD_HEADER_WORDS};
use crate::common::RecordId;

/// Integers inside this range are stored inline in the field word.
const SMALL_INT_BITS: u32 = 60;

/// Contents of a live record.
#[derive(Debug)]
pub(crate) struct RecordBody {
    /// Field values; the length is the record's fixed field count.
    pub(crate) fields: Vec<EncodedValue>,
    /// Whether the record is visible to search.
    pub(crate) indexed: bool,
}

impl RecordBody {
    fn new(field_count: usize, indexed: bool) -> Self {
        Self {
            fields: vec![EncodedValue::Null; field_count],
            indexed,
        }
    }

    /// Words charged for this record, including out-of-line payloads.
    pub(crate) fn words(&self) -> usize {
        record_words(self.fields.len()) + self.fields.iter().map(value_words).sum::<usize>()
    }
}

/// A slot in the segment's slot table.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    generation: u32,
    body: Option<RecordBody>,
}

impl Slot {
    /// Place a new record in this (vacant) slot.
    ///
    /// Returns the generation the record is born with.
    pub(crate) fn occupy(&mut self, field_count: usize, indexed: bool) -> u32 {
        debug_assert!(self.body.is_none(), "occupying a live slot");
        self.body = Some(RecordBody::new(field_count, indexed));
        self.generation
    }

    /// Free the record in this slot, invalidating every id that names it.
    ///
    /// Returns the words the record was charged.
    pub(crate) fn vacate(&mut self) -> usize {
        let words = self.body.take().map_or(0, |body| body.words());
        self.generation = self.generation.wrapping_add(1);
        words
    }

    /// The live record, if any.
    #[inline]
    pub(crate) fn body(&self) -> Option<&RecordBody> {
        self.body.as_ref()
    }

    /// The record named by `id`, if it is still live.
    #[inline]
    pub(crate) fn get(&self, id: RecordId) -> Option<&RecordBody> {
        if self.generation == id.generation() {
            self.body.as_ref()
        } else {
            None
        }
    }

    /// Mutable access to the record named by `id`, if it is still live.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<&mut RecordBody> {
        if self.generation == id.generation() {
            self.body.as_mut()
        } else {
            None
        }
    }

    /// Current generation.
    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// Words charged for a record's header and field slots.
#[inline]
pub(crate) fn record_words(field_count: usize) -> usize {
    RECORD_HEADER_WORDS + field_count
}

/// Words a value occupies outside its field slot.
pub(crate) fn value_words(value: &EncodedValue) -> usize {
    // Strings are charged with a terminator byte and a length word.
    fn text(bytes: &[u8]) -> usize {
        1 + words_for(bytes.len() + 1)
    }
    fn extra(bytes: Option<&[u8]>) -> usize {
        bytes.map_or(0, text)
    }

    match value {
        EncodedValue::Int(v) => {
            let limit = 1i64 << SMALL_INT_BITS;
            usize::from(!(-limit..limit).contains(v))
        }
        EncodedValue::Double(_) => 1,
        EncodedValue::Str { text: t, lang } => text(t) + extra(lang.as_deref()),
        EncodedValue::XmlLiteral { text: t, xsd_type } => text(t) + text(xsd_type),
        EncodedValue::Uri { text: t, prefix } => text(t) + extra(prefix.as_deref()),
        EncodedValue::Blob { data, blob_type } => text(data) + extra(blob_type.as_deref()),
        EncodedValue::AnonConst(name) => text(name),
        EncodedValue::Null
        | EncodedValue::Record(_)
        | EncodedValue::Char(_)
        | EncodedValue::FixPoint(_)
        | EncodedValue::Date(_)
        | EncodedValue::Time(_)
        | EncodedValue::Var(_)
        | EncodedValue::Illegal => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_bytes, encode_double, encode_int};

    #[test]
    fn test_slot_lifecycle() {
        let mut slot = Slot::default();
        assert!(slot.body().is_none());

        let generation = slot.occupy(3, true);
        let id = RecordId::new(0, generation);

        let body = slot.get(id).unwrap();
        assert_eq!(body.fields.len(), 3);
        assert!(body.indexed);
        assert!(body.fields.iter().all(EncodedValue::is_null));

        assert_eq!(slot.vacate(), record_words(3));
        assert!(slot.get(id).is_none());
        assert_eq!(slot.generation(), generation + 1);
    }

    #[test]
    fn test_stale_id_after_reuse() {
        let mut slot = Slot::default();
        let old = RecordId::new(0, slot.occupy(1, false));
        slot.vacate();
        let new = RecordId::new(0, slot.occupy(1, false));

        assert!(slot.get(old).is_none());
        assert!(slot.get_mut(old).is_none());
        assert!(slot.get(new).is_some());
    }

    #[test]
    fn test_value_words() {
        assert_eq!(value_words(&EncodedValue::Null), 0);
        assert_eq!(value_words(&encode_int(12)), 0);
        assert_eq!(value_words(&encode_int(i64::MAX)), 1);
        assert_eq!(value_words(&encode_double(1.0)), 1);
        // "Test" + terminator fits one word, plus the length word.
        assert_eq!(value_words(&encode_bytes("Test")), 2);
        assert_eq!(value_words(&encode_bytes("12345678")), 3);
    }

    #[test]
    fn test_body_words_include_payloads() {
        let mut slot = Slot::default();
        let id = RecordId::new(0, slot.occupy(2, true));
        slot.get_mut(id).unwrap().fields[0] = encode_double(2.0);

        assert_eq!(slot.get(id).unwrap().words(), record_words(2) + 1);
    }
}
