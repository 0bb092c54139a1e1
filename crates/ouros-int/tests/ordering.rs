//! Tests for comparison, parity, sign and hashing across representations.

use std::cmp::Ordering;

use num_bigint::BigInt;
use ouros_int::{Heap, NoLimitTracker, Value};
use pretty_assertions::assert_eq;

/// Values in ascending order, mixing inline and heap representations.
const ASCENDING: [&str; 11] = [
    "-340282366920938463463374607431768211456",
    "-9223372036854775809",
    "-9223372036854775808",
    "-9223372036854775807",
    "-1",
    "0",
    "1",
    "9223372036854775806",
    "9223372036854775807",
    "9223372036854775808",
    "340282366920938463463374607431768211456",
];

fn ascending(heap: &mut Heap<NoLimitTracker>) -> Vec<Value> {
    ASCENDING
        .iter()
        .map(|text| Value::parse(text, 10, heap).unwrap())
        .collect()
}

// =============================================================================
// 1. Total order
// =============================================================================

/// Every pair compares the way its index does: a strict total order.
#[test]
fn comparisons_form_a_strict_total_order() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let values = ascending(&mut heap);
    for (i, a) in values.iter().enumerate() {
        for (j, b) in values.iter().enumerate() {
            assert_eq!(a.cmp(b, &heap), i.cmp(&j), "{} vs {}", ASCENDING[i], ASCENDING[j]);
            assert_eq!(a.eq(b, &heap), i == j);
            assert_eq!(a.lt(b, &heap), i < j);
            assert_eq!(a.lte(b, &heap), i <= j);
            assert_eq!(a.gt(b, &heap), i > j);
            assert_eq!(a.gte(b, &heap), i >= j);
        }
    }
}

/// Equal magnitudes compare equal whatever their representation.
#[test]
fn equal_values_compare_equal_across_representations() {
    let mut heap = Heap::new(16, NoLimitTracker);
    for n in [i64::MIN, -5, 0, 3, i64::MAX] {
        let compact = Value::Int(n);
        let extended = Value::extended(&BigInt::from(n), &mut heap).unwrap();
        assert!(extended.is_bignum());
        assert_eq!(compact.cmp(&extended, &heap), Ordering::Equal);
        assert_eq!(extended.cmp(&compact, &heap), Ordering::Equal);
        assert!(compact.eq(&extended, &heap));
        assert!(!compact.is(&extended));
    }
}

/// Two heap values of equal magnitude are `eq` but not `is`.
#[test]
fn identity_differs_from_equality() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let a = Value::parse("123456789012345678901234567890", 10, &mut heap).unwrap();
    let b = Value::parse("123456789012345678901234567890", 10, &mut heap).unwrap();
    assert!(a.eq(&b, &heap));
    assert!(!a.is(&b));
    assert!(a.is(&a));
}

// =============================================================================
// 2. Parity and sign
// =============================================================================

/// `is_odd` agrees for compact 3 and an Extended value built from "3".
#[test]
fn parity_agrees_across_representations() {
    let mut heap = Heap::new(16, NoLimitTracker);
    for n in [-4_i64, -3, 0, 3, 10, i64::MAX, i64::MIN] {
        let extended = Value::extended(&BigInt::from(n), &mut heap).unwrap();
        assert_eq!(Value::Int(n).is_odd(&heap), extended.is_odd(&heap), "{n}");
        assert_eq!(Value::Int(n).is_even(&heap), extended.is_even(&heap), "{n}");
    }
}

/// Parity of large values follows the last digit.
#[test]
fn parity_of_extended_values() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let odd = Value::parse("-18446744073709551617", 10, &mut heap).unwrap();
    let even = Value::parse("18446744073709551616", 10, &mut heap).unwrap();
    assert!(odd.is_odd(&heap));
    assert!(even.is_even(&heap));
}

/// Sign and zero queries agree with the rendered value.
#[test]
fn sign_queries() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let values = ascending(&mut heap);
    for (text, value) in ASCENDING.iter().zip(&values) {
        assert_eq!(value.is_negative(&heap), text.starts_with('-'), "{text}");
        assert_eq!(value.is_zero(&heap), *text == "0", "{text}");
    }
    let zero = Value::extended(&BigInt::from(0), &mut heap).unwrap();
    assert!(zero.is_zero(&heap));
    assert!(!zero.is_negative(&heap));
}

// =============================================================================
// 3. Hashing
// =============================================================================

/// Equal values hash equally regardless of representation.
#[test]
fn hash_is_representation_independent() {
    let mut heap = Heap::new(16, NoLimitTracker);
    for n in [i64::MIN, -1, 0, 42, i64::MAX] {
        let extended = Value::extended(&BigInt::from(n), &mut heap).unwrap();
        assert_eq!(Value::Int(n).hash_value(&heap), extended.hash_value(&heap), "{n}");
    }

    let a = Value::parse("340282366920938463463374607431768211456", 10, &mut heap).unwrap();
    let b = Value::parse("340282366920938463463374607431768211456", 10, &mut heap).unwrap();
    assert_eq!(a.hash_value(&heap), b.hash_value(&heap));
}

// =============================================================================
// 4. Conversions
// =============================================================================

/// `to_i64` succeeds only within range; `to_f64` rounds to the nearest float.
#[test]
fn numeric_conversions() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let values = ascending(&mut heap);
    assert_eq!(values[2].to_i64(&heap), Some(i64::MIN));
    assert_eq!(values[1].to_i64(&heap), None);
    assert_eq!(values[9].to_i64(&heap), None);

    assert_eq!(values[9].to_f64(&heap), 9_223_372_036_854_775_808.0);
    assert_eq!(values[0].to_f64(&heap), -340_282_366_920_938_463_463_374_607_431_768_211_456.0);
    assert_eq!(values[6].to_f64(&heap), 1.0);
}
