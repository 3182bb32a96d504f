//! Field codec.
//!
//! Converts between native values and the tagged [`EncodedValue`] stored in
//! record fields:
//! - [`FieldType`] - Type tags and their interop codes
//! - [`EncodedValue`] - The tagged value itself
//! - `encode_*` / `decode_*` - Typed constructors and checked accessors
//! - [`compare`] - Total order used by search conditions

mod compare;
mod field_type;
mod value;

pub use compare::compare;
pub use field_type::{
    FieldType, ANON_CONST_TYPE, BLOB_TYPE, CHAR_TYPE, DATE_TYPE, DOUBLE_TYPE, FIXPOINT_TYPE,
    ILLEGAL, INT_TYPE, NULL_TYPE, RECORD_TYPE, STR_TYPE, TIME_TYPE, URI_TYPE, VAR_TYPE,
    XML_LITERAL_TYPE,
};
pub use value::{
    decode_anon_const, decode_blob, decode_bytes, decode_bytes_shared, decode_char, decode_date,
    decode_double, decode_fixpoint, decode_int, decode_record, decode_str_lang, decode_time,
    decode_type, decode_uri, decode_var, decode_xml_literal, encode_anon_const, encode_blob,
    encode_bytes, encode_char, encode_date, encode_double, encode_fixpoint, encode_int,
    encode_null, encode_record, encode_str, encode_time, encode_uri, encode_var,
    encode_xml_literal, EncodedValue,
};
