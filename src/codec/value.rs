//! Tagged field values and their encoders/decoders.
//!
//! Encoding is pure: it only wraps the input in the variant for its type.
//! Decoding checks the tag and fails with [`Error::TypeMismatch`] when the
//! value holds a different type, so callers either check
//! [`decode_type`] first or accept the error.
//!
//! Byte payloads are [`Bytes`]. Encoding a `Bytes` or `Vec<u8>` does not copy,
//! and the byte decoders hand out borrowed views whose lifetime is bounded by
//! the value they were decoded from.

use bytes::Bytes;

use super::field_type::FieldType;
use crate::common::config::{CENTISECONDS_PER_DAY, FIXPOINT_MAX, FIXPOINT_SCALE};
use crate::common::{Error, RecordId, Result};

/// A field value tagged with its type.
///
/// This is what a field slot stores. [`EncodedValue::Null`] is the content of
/// every freshly created field; [`EncodedValue::Illegal`] is the sentinel
/// returned when a field cannot be read at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EncodedValue {
    /// No value.
    #[default]
    Null,
    /// Reference to another record in the same store.
    Record(RecordId),
    /// Signed integer.
    Int(i64),
    /// Double-precision float.
    Double(f64),
    /// Byte string with an optional language tag.
    Str {
        /// String contents.
        text: Bytes,
        /// Language tag, e.g. `en`.
        lang: Option<Bytes>,
    },
    /// XML literal with its XSD type.
    XmlLiteral {
        /// Literal text.
        text: Bytes,
        /// XSD type name.
        xsd_type: Bytes,
    },
    /// URI with an optional namespace prefix.
    Uri {
        /// URI text (or local part when a prefix is given).
        text: Bytes,
        /// Namespace prefix.
        prefix: Option<Bytes>,
    },
    /// Binary blob with an optional blob type.
    Blob {
        /// Raw bytes.
        data: Bytes,
        /// Application-defined blob type, e.g. a MIME type.
        blob_type: Option<Bytes>,
    },
    /// Single character.
    Char(char),
    /// Fixed-point number, scaled by `FIXPOINT_SCALE`.
    FixPoint(i32),
    /// Date as a day number.
    Date(i32),
    /// Time of day in centiseconds since midnight.
    Time(i32),
    /// Anonymous constant name.
    AnonConst(Bytes),
    /// Variable number.
    Var(u32),
    /// Error sentinel.
    Illegal,
}

impl EncodedValue {
    /// The type tag of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            EncodedValue::Null => FieldType::Null,
            EncodedValue::Record(_) => FieldType::Record,
            EncodedValue::Int(_) => FieldType::Int,
            EncodedValue::Double(_) => FieldType::Double,
            EncodedValue::Str { .. } => FieldType::Str,
            EncodedValue::XmlLiteral { .. } => FieldType::XmlLiteral,
            EncodedValue::Uri { .. } => FieldType::Uri,
            EncodedValue::Blob { .. } => FieldType::Blob,
            EncodedValue::Char(_) => FieldType::Char,
            EncodedValue::FixPoint(_) => FieldType::FixPoint,
            EncodedValue::Date(_) => FieldType::Date,
            EncodedValue::Time(_) => FieldType::Time,
            EncodedValue::AnonConst(_) => FieldType::AnonConst,
            EncodedValue::Var(_) => FieldType::Var,
            EncodedValue::Illegal => FieldType::Illegal,
        }
    }

    /// True for [`EncodedValue::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, EncodedValue::Null)
    }
}

impl From<i64> for EncodedValue {
    fn from(value: i64) -> Self {
        encode_int(value)
    }
}

impl From<f64> for EncodedValue {
    fn from(value: f64) -> Self {
        encode_double(value)
    }
}

impl From<&[u8]> for EncodedValue {
    fn from(value: &[u8]) -> Self {
        encode_bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for EncodedValue {
    fn from(value: Vec<u8>) -> Self {
        encode_bytes(value)
    }
}

impl From<&str> for EncodedValue {
    fn from(value: &str) -> Self {
        encode_bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

#[inline]
fn mismatch(expected: FieldType, value: &EncodedValue) -> Error {
    Error::TypeMismatch {
        expected,
        found: value.field_type(),
    }
}

// ============================================================================
// Encoders
// ============================================================================

/// Encode a null value.
#[inline]
pub fn encode_null() -> EncodedValue {
    EncodedValue::Null
}

/// Encode a reference to a record.
#[inline]
pub fn encode_record(id: RecordId) -> EncodedValue {
    EncodedValue::Record(id)
}

/// Encode an integer.
#[inline]
pub fn encode_int(value: i64) -> EncodedValue {
    EncodedValue::Int(value)
}

/// Encode a double.
#[inline]
pub fn encode_double(value: f64) -> EncodedValue {
    EncodedValue::Double(value)
}

/// Encode a byte string without a language tag.
#[inline]
pub fn encode_bytes(bytes: impl Into<Bytes>) -> EncodedValue {
    EncodedValue::Str {
        text: bytes.into(),
        lang: None,
    }
}

/// Encode a byte string with an optional language tag.
pub fn encode_str(text: impl Into<Bytes>, lang: Option<Bytes>) -> EncodedValue {
    EncodedValue::Str {
        text: text.into(),
        lang,
    }
}

/// Encode an XML literal.
pub fn encode_xml_literal(text: impl Into<Bytes>, xsd_type: impl Into<Bytes>) -> EncodedValue {
    EncodedValue::XmlLiteral {
        text: text.into(),
        xsd_type: xsd_type.into(),
    }
}

/// Encode a URI.
pub fn encode_uri(text: impl Into<Bytes>, prefix: Option<Bytes>) -> EncodedValue {
    EncodedValue::Uri {
        text: text.into(),
        prefix,
    }
}

/// Encode a binary blob.
pub fn encode_blob(data: impl Into<Bytes>, blob_type: Option<Bytes>) -> EncodedValue {
    EncodedValue::Blob {
        data: data.into(),
        blob_type,
    }
}

/// Encode a character.
#[inline]
pub fn encode_char(value: char) -> EncodedValue {
    EncodedValue::Char(value)
}

/// Encode a fixed-point number with four decimal digits.
///
/// # Errors
/// `Error::InvalidValue` if `|value| > 800` or the value is not finite.
pub fn encode_fixpoint(value: f64) -> Result<EncodedValue> {
    if !value.is_finite() || value.abs() > FIXPOINT_MAX {
        return Err(Error::InvalidValue(format!(
            "fixpoint {} outside ±{}",
            value, FIXPOINT_MAX
        )));
    }
    Ok(EncodedValue::FixPoint((value * FIXPOINT_SCALE).round() as i32))
}

/// Encode a date given as a day number.
#[inline]
pub fn encode_date(days: i32) -> EncodedValue {
    EncodedValue::Date(days)
}

/// Encode a time of day given in centiseconds since midnight.
///
/// # Errors
/// `Error::InvalidValue` unless `0 <= centiseconds < 8_640_000`.
pub fn encode_time(centiseconds: i32) -> Result<EncodedValue> {
    if !(0..CENTISECONDS_PER_DAY).contains(&centiseconds) {
        return Err(Error::InvalidValue(format!(
            "time {} outside one day",
            centiseconds
        )));
    }
    Ok(EncodedValue::Time(centiseconds))
}

/// Encode an anonymous constant.
#[inline]
pub fn encode_anon_const(name: impl Into<Bytes>) -> EncodedValue {
    EncodedValue::AnonConst(name.into())
}

/// Encode a variable.
#[inline]
pub fn encode_var(id: u32) -> EncodedValue {
    EncodedValue::Var(id)
}

// ============================================================================
// Decoders
// ============================================================================

/// Classify a value. Never fails.
#[inline]
pub fn decode_type(value: &EncodedValue) -> FieldType {
    value.field_type()
}

/// Decode a record reference.
pub fn decode_record(value: &EncodedValue) -> Result<RecordId> {
    match value {
        EncodedValue::Record(id) => Ok(*id),
        other => Err(mismatch(FieldType::Record, other)),
    }
}

/// Decode an integer.
pub fn decode_int(value: &EncodedValue) -> Result<i64> {
    match value {
        EncodedValue::Int(v) => Ok(*v),
        other => Err(mismatch(FieldType::Int, other)),
    }
}

/// Decode a double.
pub fn decode_double(value: &EncodedValue) -> Result<f64> {
    match value {
        EncodedValue::Double(v) => Ok(*v),
        other => Err(mismatch(FieldType::Double, other)),
    }
}

/// Decode the contents of a byte string without copying.
pub fn decode_bytes(value: &EncodedValue) -> Result<&[u8]> {
    match value {
        EncodedValue::Str { text, .. } => Ok(&text[..]),
        other => Err(mismatch(FieldType::Str, other)),
    }
}

/// Decode a byte string as a shared buffer (a refcount bump, no copy).
pub fn decode_bytes_shared(value: &EncodedValue) -> Result<Bytes> {
    match value {
        EncodedValue::Str { text, .. } => Ok(text.clone()),
        other => Err(mismatch(FieldType::Str, other)),
    }
}

/// Decode the language tag of a byte string.
pub fn decode_str_lang(value: &EncodedValue) -> Result<Option<&[u8]>> {
    match value {
        EncodedValue::Str { lang, .. } => Ok(lang.as_deref()),
        other => Err(mismatch(FieldType::Str, other)),
    }
}

/// Decode an XML literal into `(text, xsd_type)`.
pub fn decode_xml_literal(value: &EncodedValue) -> Result<(&[u8], &[u8])> {
    match value {
        EncodedValue::XmlLiteral { text, xsd_type } => Ok((&text[..], &xsd_type[..])),
        other => Err(mismatch(FieldType::XmlLiteral, other)),
    }
}

/// Decode a URI into `(text, prefix)`.
pub fn decode_uri(value: &EncodedValue) -> Result<(&[u8], Option<&[u8]>)> {
    match value {
        EncodedValue::Uri { text, prefix } => Ok((&text[..], prefix.as_deref())),
        other => Err(mismatch(FieldType::Uri, other)),
    }
}

/// Decode a blob into `(data, blob_type)`.
pub fn decode_blob(value: &EncodedValue) -> Result<(&[u8], Option<&[u8]>)> {
    match value {
        EncodedValue::Blob { data, blob_type } => Ok((&data[..], blob_type.as_deref())),
        other => Err(mismatch(FieldType::Blob, other)),
    }
}

/// Decode a character.
pub fn decode_char(value: &EncodedValue) -> Result<char> {
    match value {
        EncodedValue::Char(c) => Ok(*c),
        other => Err(mismatch(FieldType::Char, other)),
    }
}

/// Decode a fixed-point number.
pub fn decode_fixpoint(value: &EncodedValue) -> Result<f64> {
    match value {
        EncodedValue::FixPoint(v) => Ok(f64::from(*v) / FIXPOINT_SCALE),
        other => Err(mismatch(FieldType::FixPoint, other)),
    }
}

/// Decode a date.
pub fn decode_date(value: &EncodedValue) -> Result<i32> {
    match value {
        EncodedValue::Date(v) => Ok(*v),
        other => Err(mismatch(FieldType::Date, other)),
    }
}

/// Decode a time of day.
pub fn decode_time(value: &EncodedValue) -> Result<i32> {
    match value {
        EncodedValue::Time(v) => Ok(*v),
        other => Err(mismatch(FieldType::Time, other)),
    }
}

/// Decode an anonymous constant.
pub fn decode_anon_const(value: &EncodedValue) -> Result<&[u8]> {
    match value {
        EncodedValue::AnonConst(name) => Ok(&name[..]),
        other => Err(mismatch(FieldType::AnonConst, other)),
    }
}

/// Decode a variable.
pub fn decode_var(value: &EncodedValue) -> Result<u32> {
    match value {
        EncodedValue::Var(v) => Ok(*v),
        other => Err(mismatch(FieldType::Var, other)),
    }
}
