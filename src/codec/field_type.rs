//! Field type tags.
//!
//! Every [`EncodedValue`](super::EncodedValue) carries one of these tags, so
//! a value's type can be recovered without any external schema. The numeric
//! tags are stable and exported as constants for callers that classify
//! values by integer code.

use std::fmt;

/// Tag of a null (unset) field.
pub const NULL_TYPE: u8 = 1;
/// Tag of a reference to another record.
pub const RECORD_TYPE: u8 = 2;
/// Tag of a 64-bit signed integer.
pub const INT_TYPE: u8 = 3;
/// Tag of a 64-bit float.
pub const DOUBLE_TYPE: u8 = 4;
/// Tag of a byte string with optional language.
pub const STR_TYPE: u8 = 5;
/// Tag of an XML literal with its XSD type.
pub const XML_LITERAL_TYPE: u8 = 6;
/// Tag of a URI with optional prefix.
pub const URI_TYPE: u8 = 7;
/// Tag of a binary blob with optional blob type.
pub const BLOB_TYPE: u8 = 8;
/// Tag of a single character.
pub const CHAR_TYPE: u8 = 9;
/// Tag of a fixed-point number.
pub const FIXPOINT_TYPE: u8 = 10;
/// Tag of a date (days).
pub const DATE_TYPE: u8 = 11;
/// Tag of a time of day (centiseconds).
pub const TIME_TYPE: u8 = 12;
/// Tag of an anonymous constant.
pub const ANON_CONST_TYPE: u8 = 13;
/// Tag of a variable.
pub const VAR_TYPE: u8 = 14;
/// Tag of the error sentinel.
pub const ILLEGAL: u8 = 0xff;

/// Type of a stored field value.
///
/// Uses `#[repr(u8)]` so `field_type as u8` yields the interop tag.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// No value.
    #[default]
    Null = NULL_TYPE,
    /// Reference to a record in the same store.
    Record = RECORD_TYPE,
    /// Signed integer.
    Int = INT_TYPE,
    /// Double-precision float.
    Double = DOUBLE_TYPE,
    /// Byte string.
    Str = STR_TYPE,
    /// XML literal.
    XmlLiteral = XML_LITERAL_TYPE,
    /// URI.
    Uri = URI_TYPE,
    /// Binary blob.
    Blob = BLOB_TYPE,
    /// Single character.
    Char = CHAR_TYPE,
    /// Fixed-point number.
    FixPoint = FIXPOINT_TYPE,
    /// Date.
    Date = DATE_TYPE,
    /// Time of day.
    Time = TIME_TYPE,
    /// Anonymous constant.
    AnonConst = ANON_CONST_TYPE,
    /// Variable.
    Var = VAR_TYPE,
    /// Error sentinel.
    Illegal = ILLEGAL,
}

impl FieldType {
    /// Convert from an interop tag, returning Illegal for unknown values.
    pub fn from_code(code: u8) -> Self {
        match code {
            NULL_TYPE => FieldType::Null,
            RECORD_TYPE => FieldType::Record,
            INT_TYPE => FieldType::Int,
            DOUBLE_TYPE => FieldType::Double,
            STR_TYPE => FieldType::Str,
            XML_LITERAL_TYPE => FieldType::XmlLiteral,
            URI_TYPE => FieldType::Uri,
            BLOB_TYPE => FieldType::Blob,
            CHAR_TYPE => FieldType::Char,
            FIXPOINT_TYPE => FieldType::FixPoint,
            DATE_TYPE => FieldType::Date,
            TIME_TYPE => FieldType::Time,
            ANON_CONST_TYPE => FieldType::AnonConst,
            VAR_TYPE => FieldType::Var,
            _ => FieldType::Illegal,
        }
    }

    /// The interop tag.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::Record => "record",
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::Str => "str",
            FieldType::XmlLiteral => "xmlliteral",
            FieldType::Uri => "uri",
            FieldType::Blob => "blob",
            FieldType::Char => "char",
            FieldType::FixPoint => "fixpoint",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::AnonConst => "anonconst",
            FieldType::Var => "var",
            FieldType::Illegal => "illegal",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
