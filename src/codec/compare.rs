//! Total ordering over encoded values.
//!
//! Search conditions are evaluated with [`compare`]. Values of different
//! types order by their type tag; values of the same type order by content.
//! The order is total (doubles use `f64::total_cmp`), so every condition has
//! a defined answer for every pair of values.

use std::cmp::Ordering;

use bytes::Bytes;

use super::EncodedValue;

/// Compare two values.
pub fn compare(a: &EncodedValue, b: &EncodedValue) -> Ordering {
    let (ta, tb) = (a.field_type(), b.field_type());
    if ta != tb {
        return ta.cmp(&tb);
    }

    match (a, b) {
        (EncodedValue::Record(x), EncodedValue::Record(y)) => x.cmp(y),
        (EncodedValue::Int(x), EncodedValue::Int(y)) => x.cmp(y),
        (EncodedValue::Double(x), EncodedValue::Double(y)) => x.total_cmp(y),
        (
            EncodedValue::Str { text: x, lang: lx },
            EncodedValue::Str { text: y, lang: ly },
        ) => x.cmp(y).then_with(|| cmp_extra(lx, ly)),
        (
            EncodedValue::XmlLiteral {
                text: x,
                xsd_type: tx,
            },
            EncodedValue::XmlLiteral {
                text: y,
                xsd_type: ty,
            },
        ) => x.cmp(y).then_with(|| tx.cmp(ty)),
        (
            EncodedValue::Uri {
                text: x,
                prefix: px,
            },
            EncodedValue::Uri {
                text: y,
                prefix: py,
            },
        ) => cmp_extra(px, py).then_with(|| x.cmp(y)),
        (
            EncodedValue::Blob {
                data: x,
                blob_type: bx,
            },
            EncodedValue::Blob {
                data: y,
                blob_type: by,
            },
        ) => x.cmp(y).then_with(|| cmp_extra(bx, by)),
        (EncodedValue::Char(x), EncodedValue::Char(y)) => x.cmp(y),
        (EncodedValue::FixPoint(x), EncodedValue::FixPoint(y)) => x.cmp(y),
        (EncodedValue::Date(x), EncodedValue::Date(y)) => x.cmp(y),
        (EncodedValue::Time(x), EncodedValue::Time(y)) => x.cmp(y),
        (EncodedValue::AnonConst(x), EncodedValue::AnonConst(y)) => x.cmp(y),
        (EncodedValue::Var(x), EncodedValue::Var(y)) => x.cmp(y),
        // Null and Illegal carry no content.
        _ => Ordering::Equal,
    }
}

fn cmp_extra(a: &Option<Bytes>, b: &Option<Bytes>) -> Ordering {
    a.as_deref().cmp(&b.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_bytes, encode_double, encode_int, encode_str, encode_uri};
    use proptest::prelude::*;

    #[test]
    fn test_same_type_orders_by_content() {
        assert_eq!(compare(&encode_int(1), &encode_int(2)), Ordering::Less);
        assert_eq!(compare(&encode_int(2), &encode_int(2)), Ordering::Equal);
        assert_eq!(
            compare(&encode_double(2.5), &encode_double(-1.0)),
            Ordering::Greater
        );
        assert_eq!(
            compare(&encode_bytes("abc"), &encode_bytes("abd")),
            Ordering::Less
        );
    }

    #[test]
    fn test_different_types_order_by_tag() {
        // Int (3) < Double (4) regardless of magnitude.
        assert_eq!(
            compare(&encode_int(i64::MAX), &encode_double(-1.0)),
            Ordering::Less
        );
        assert_eq!(
            compare(&EncodedValue::Null, &encode_int(i64::MIN)),
            Ordering::Less
        );
        assert_ne!(compare(&encode_int(3), &encode_double(3.0)), Ordering::Equal);
    }

    #[test]
    fn test_extras_break_ties() {
        let plain = encode_bytes("hello");
        let tagged = encode_str("hello", Some(Bytes::from_static(b"en")));
        assert_eq!(compare(&plain, &tagged), Ordering::Less);

        let a = encode_uri("x", Some(Bytes::from_static(b"a:")));
        let b = encode_uri("x", Some(Bytes::from_static(b"b:")));
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_nan_is_ordered() {
        let nan = encode_double(f64::NAN);
        assert_eq!(compare(&nan, &nan), Ordering::Equal);
        assert_eq!(compare(&encode_double(1.0), &nan), Ordering::Less);
    }

    fn arb_value() -> impl Strategy<Value = EncodedValue> {
        prop_oneof![
            Just(EncodedValue::Null),
            any::<i64>().prop_map(encode_int),
            any::<f64>().prop_map(encode_double),
            proptest::collection::vec(any::<u8>(), 0..8).prop_map(|v| encode_bytes(v)),
        ]
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }

        #[test]
        fn prop_compare_is_transitive(a in arb_value(), b in arb_value(), c in arb_value()) {
            if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(compare(&a, &c), Ordering::Greater);
            }
        }
    }
}
