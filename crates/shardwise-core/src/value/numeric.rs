use crate::{
    error::InternalError,
    value::{NumericRepr, Value},
};

/// Add two partial aggregate values without wrapping.
///
/// Integer sums widen from `i64` through `i128` into arbitrary precision as
/// needed; any float operand promotes the sum to `f64`. Null is the additive
/// identity so shards that saw no rows do not poison the total.
pub fn widening_add(left: &Value, right: &Value) -> Result<Value, InternalError> {
    if right.is_null() {
        return Ok(left.clone());
    }
    if left.is_null() {
        return Ok(right.clone());
    }

    let (Some(a), Some(b)) = (left.numeric_repr(), right.numeric_repr()) else {
        return Err(InternalError::merge_unsupported(format!(
            "cannot add non-numeric aggregate values {left} and {right}"
        )));
    };

    let sum = match (a, b) {
        (NumericRepr::Int(a), NumericRepr::Int(b)) => match a.checked_add(b) {
            Some(sum) => NumericRepr::Int(sum),
            None => NumericRepr::Big(num_bigint::BigInt::from(a) + b),
        },
        (a @ NumericRepr::Float(_), b) | (a, b @ NumericRepr::Float(_)) => {
            NumericRepr::Float(a.to_f64() + b.to_f64())
        }
        (a, b) => match (a.to_big(), b.to_big()) {
            (Some(a), Some(b)) => NumericRepr::from_big(a + b),
            _ => {
                return Err(InternalError::merge_invariant(
                    "integer aggregate operand lost its integer view",
                ));
            }
        },
    };

    Ok(sum.into_value())
}

/// Divide an aggregate sum by a row count, yielding `Float64`.
///
/// A null sum or a zero/null count yields null (no rows contributed).
pub fn checked_divide(sum: &Value, count: &Value) -> Result<Value, InternalError> {
    if sum.is_null() || count.is_null() {
        return Ok(Value::Null);
    }

    let (Some(sum), Some(count)) = (sum.to_f64(), count.to_f64()) else {
        return Err(InternalError::merge_unsupported(format!(
            "cannot divide non-numeric aggregate values {sum} / {count}"
        )));
    };
    if count == 0.0 {
        return Ok(Value::Null);
    }

    Ok(Value::Float64(sum / count))
}
