use crate::value::{NumericRepr, Value};
use num_bigint::BigInt;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// Collation
///
/// Text comparison rule attached to one order-by or group-by item.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Collation {
    #[default]
    Binary,
    CaseInsensitive,
}

/// Total canonical comparator used by merge ordering, grouping and distinct.
///
/// Ordering rules:
/// 1. Canonical family rank (null < bool < numeric < text < blob)
/// 2. Family-specific comparison for same-ranked values
///
/// Numeric values compare by magnitude regardless of physical width, so an
/// `Int(3)` from one shard and an `Int128(3)` from another are equal.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    collated_cmp(left, right, Collation::Binary)
}

/// Canonical comparator with an explicit text collation.
#[must_use]
pub fn collated_cmp(left: &Value, right: &Value, collation: Collation) -> Ordering {
    let rank = left.canonical_rank().cmp(&right.canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    cmp_same_rank(left, right, collation)
}

/// Semantic equality under the canonical comparator.
#[must_use]
pub fn canonical_eq(left: &Value, right: &Value) -> bool {
    canonical_cmp(left, right) == Ordering::Equal
}

fn cmp_same_rank(left: &Value, right: &Value, collation: Collation) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => cmp_text(a, b, collation),
        (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
        _ => match (left.numeric_repr(), right.numeric_repr()) {
            (Some(a), Some(b)) => cmp_numeric(&a, &b),
            // Nulls and any remaining same-rank pairs are peers.
            _ => Ordering::Equal,
        },
    }
}

fn cmp_text(left: &str, right: &str, collation: Collation) -> Ordering {
    match collation {
        Collation::Binary => left.cmp(right),
        Collation::CaseInsensitive => left
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(right.chars().flat_map(char::to_lowercase)),
    }
}

pub(crate) fn cmp_numeric(left: &NumericRepr, right: &NumericRepr) -> Ordering {
    match (left, right) {
        (NumericRepr::Int(a), NumericRepr::Int(b)) => a.cmp(b),
        (NumericRepr::Float(a), NumericRepr::Float(b)) => cmp_float(*a, *b),
        (NumericRepr::Float(a), other) => cmp_float_integer(*a, other),
        (other, NumericRepr::Float(b)) => cmp_float_integer(*b, other).reverse(),
        (a, b) => match (a.to_big(), b.to_big()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        },
    }
}

fn cmp_float(left: f64, right: f64) -> Ordering {
    left.partial_cmp(&right)
        .unwrap_or_else(|| left.total_cmp(&right))
}

// Compare a float with an exact integer without losing integer precision.
fn cmp_float_integer(float: f64, integer: &NumericRepr) -> Ordering {
    if float.is_nan() {
        return Ordering::Greater;
    }
    if float.is_infinite() {
        return if float > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }

    let Some(integer) = integer.to_big() else {
        return Ordering::Equal;
    };
    let Some(truncated) = BigInt::from_f64(float.trunc()) else {
        return Ordering::Equal;
    };

    match truncated.cmp(&integer) {
        Ordering::Equal if float.fract() > 0.0 => Ordering::Greater,
        Ordering::Equal if float.fract() < 0.0 => Ordering::Less,
        ordering => ordering,
    }
}
