use crate::value::{
    Collation, Value, ValueHasher, canonical_cmp, canonical_eq, checked_divide, collated_cmp,
    hash_value, hash_values, widening_add,
};
use num_bigint::BigInt;
use proptest::prelude::*;
use std::cmp::Ordering;

// ---- helpers -----------------------------------------------------------

fn v_i(x: i64) -> Value {
    Value::Int(x)
}
fn v_u(x: u64) -> Value {
    Value::Uint(x)
}
fn v_f64(x: f64) -> Value {
    Value::Float64(x)
}
fn v_txt(s: &str) -> Value {
    Value::Text(s.to_string())
}

// ---- ordering ----------------------------------------------------------

#[test]
fn numeric_widths_compare_by_magnitude() {
    assert_eq!(canonical_cmp(&v_i(3), &Value::Int128(3)), Ordering::Equal);
    assert_eq!(canonical_cmp(&v_u(3), &v_i(3)), Ordering::Equal);
    assert_eq!(canonical_cmp(&v_i(-1), &v_u(0)), Ordering::Less);
    assert_eq!(
        canonical_cmp(&Value::IntBig(BigInt::from(7)), &v_i(7)),
        Ordering::Equal
    );
    assert_eq!(
        canonical_cmp(&v_u(u64::MAX), &v_i(i64::MAX)),
        Ordering::Greater
    );
}

#[test]
fn floats_compare_exactly_against_integers() {
    assert_eq!(canonical_cmp(&v_f64(2.5), &v_i(2)), Ordering::Greater);
    assert_eq!(canonical_cmp(&v_f64(-2.5), &v_i(-2)), Ordering::Less);
    assert_eq!(canonical_cmp(&v_f64(4.0), &v_u(4)), Ordering::Equal);
    assert_eq!(canonical_cmp(&v_i(5), &v_f64(5.5)), Ordering::Less);
    assert_eq!(
        canonical_cmp(&v_f64(f64::INFINITY), &Value::Int128(i128::MAX)),
        Ordering::Greater
    );
}

#[test]
fn null_ranks_below_every_family() {
    for other in [Value::Bool(false), v_i(i64::MIN), v_txt(""), Value::Blob(vec![])] {
        assert_eq!(canonical_cmp(&Value::Null, &other), Ordering::Less);
    }
    assert_eq!(canonical_cmp(&Value::Null, &Value::Null), Ordering::Equal);
}

#[test]
fn case_insensitive_collation_folds_text() {
    assert_eq!(
        collated_cmp(&v_txt("Apple"), &v_txt("apple"), Collation::CaseInsensitive),
        Ordering::Equal
    );
    assert_eq!(
        collated_cmp(&v_txt("Apple"), &v_txt("apple"), Collation::Binary),
        Ordering::Less
    );
    assert_eq!(
        collated_cmp(&v_txt("b"), &v_txt("A"), Collation::CaseInsensitive),
        Ordering::Greater
    );
}

// ---- hashing -----------------------------------------------------------

#[test]
fn equal_numerics_hash_equally_across_widths() {
    let expected = hash_value(&v_i(42));
    assert_eq!(hash_value(&v_u(42)), expected);
    assert_eq!(hash_value(&Value::Int128(42)), expected);
    assert_eq!(hash_value(&Value::IntBig(BigInt::from(42))), expected);
    assert_eq!(hash_value(&v_f64(42.0)), expected);
    assert_ne!(hash_value(&v_f64(42.5)), expected);
}

#[test]
fn hash_distinguishes_families_and_tuple_boundaries() {
    assert_ne!(hash_value(&v_txt("1")), hash_value(&v_i(1)));
    assert_ne!(hash_value(&Value::Null), hash_value(&Value::Bool(false)));
    assert_ne!(
        hash_values(&[v_txt("ab"), v_txt("c")]),
        hash_values(&[v_txt("a"), v_txt("bc")])
    );
    assert_ne!(hash_values(&[v_i(1)]), hash_values(&[v_i(1), Value::Null]));
}

#[test]
fn case_insensitive_hash_matches_collated_equality() {
    let mut upper = ValueHasher::new();
    upper.push(&v_txt("ABC"), Collation::CaseInsensitive);
    let mut lower = ValueHasher::new();
    lower.push(&v_txt("abc"), Collation::CaseInsensitive);

    assert_eq!(upper.finish(), lower.finish());
}

// ---- arithmetic --------------------------------------------------------

#[test]
fn widening_add_promotes_past_i64() {
    let sum = widening_add(&v_i(i64::MAX), &v_i(1)).expect("sum");
    assert_eq!(sum, Value::Int128(i128::from(i64::MAX) + 1));

    let sum = widening_add(&Value::Int128(i128::MAX), &v_i(1)).expect("sum");
    assert_eq!(sum, Value::IntBig(BigInt::from(i128::MAX) + 1));
}

#[test]
fn widening_add_treats_null_as_identity() {
    assert_eq!(widening_add(&Value::Null, &v_i(4)).expect("sum"), v_i(4));
    assert_eq!(widening_add(&v_u(4), &Value::Null).expect("sum"), v_u(4));
    assert_eq!(
        widening_add(&Value::Null, &Value::Null).expect("sum"),
        Value::Null
    );
}

#[test]
fn widening_add_promotes_to_float() {
    assert_eq!(widening_add(&v_i(1), &v_f64(0.5)).expect("sum"), v_f64(1.5));
}

#[test]
fn widening_add_rejects_text() {
    let err = widening_add(&v_txt("a"), &v_i(1)).expect_err("text is not summable");
    assert_eq!(err.class, crate::error::ErrorClass::Unsupported);
}

#[test]
fn checked_divide_yields_float_or_null() {
    assert_eq!(checked_divide(&v_i(7), &v_i(2)).expect("avg"), v_f64(3.5));
    assert_eq!(checked_divide(&v_i(7), &v_i(0)).expect("avg"), Value::Null);
    assert_eq!(checked_divide(&Value::Null, &v_i(3)).expect("avg"), Value::Null);
}

#[test]
fn integral_text_converts_to_integer() {
    assert_eq!(v_txt(" 12 ").to_i128(), Some(12));
    assert_eq!(v_txt("x").to_i128(), None);
    assert_eq!(v_f64(8.0).to_i128(), Some(8));
    assert_eq!(v_f64(8.5).to_i128(), None);
}

// ---- properties --------------------------------------------------------

proptest! {
    #[test]
    fn sum_of_i64_never_wraps(values in prop::collection::vec(any::<i64>(), 0..32)) {
        let mut total = Value::Null;
        for value in &values {
            total = widening_add(&total, &v_i(*value)).expect("integer sum");
        }

        let expected = values.iter().fold(BigInt::from(0), |acc, value| acc + *value);
        if values.is_empty() {
            prop_assert_eq!(total, Value::Null);
        } else {
            prop_assert_eq!(total.to_integer(), Some(expected));
        }
    }

    #[test]
    fn canonical_cmp_agrees_with_hash_equality(a in any::<i64>(), b in any::<u32>()) {
        let left = v_i(a);
        let right = Value::Uint(u64::from(b));
        if canonical_eq(&left, &right) {
            prop_assert_eq!(hash_value(&left), hash_value(&right));
        } else {
            prop_assert_ne!(hash_value(&left), hash_value(&right));
        }
    }
}

// ---- ranges ------------------------------------------------------------

mod range {
    use super::*;
    use crate::value::ValueRange;
    use std::ops::Bound;

    #[test]
    fn contains_honors_bound_inclusivity() {
        let range = ValueRange::new(Bound::Excluded(v_i(1)), Bound::Included(v_i(5)));
        assert!(!range.contains(&v_i(1)));
        assert!(range.contains(&v_u(2)));
        assert!(range.contains(&Value::Int128(5)));
        assert!(!range.contains(&v_i(6)));
        assert!(!range.contains(&Value::Null));
    }

    #[test]
    fn intersect_keeps_the_tighter_bounds() {
        let merged = ValueRange::at_least(v_i(3)).intersect(&ValueRange::less_than(v_i(9)));
        assert_eq!(merged, ValueRange::new(Bound::Included(v_i(3)), Bound::Excluded(v_i(9))));

        let merged = ValueRange::at_least(v_i(3)).intersect(&ValueRange::greater_than(v_i(3)));
        assert_eq!(merged.lower, Bound::Excluded(v_i(3)));
    }

    #[test]
    fn empty_ranges_are_detected() {
        assert!(ValueRange::closed(v_i(5), v_i(4)).is_empty());
        assert!(ValueRange::new(Bound::Excluded(v_i(4)), Bound::Included(v_i(4))).is_empty());
        assert!(!ValueRange::closed(v_i(4), v_i(4)).is_empty());
        assert!(!ValueRange::at_most(v_i(0)).is_empty());
    }
}
