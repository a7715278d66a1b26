mod compare;
mod hash;
mod numeric;
mod range;

#[cfg(test)]
mod tests;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt;

// re-exports
pub use compare::{Collation, canonical_cmp, canonical_eq, collated_cmp};
pub use hash::{ValueHash, ValueHasher, hash_value, hash_values};
pub use numeric::{checked_divide, widening_add};
pub use range::ValueRange;

///
/// NumericRepr
///
/// Width-independent view of one numeric value. Shards may report the same
/// logical column with different physical widths, so every numeric
/// comparison and combination goes through this representation.
///

#[derive(Clone, Debug)]
pub(crate) enum NumericRepr {
    Int(i128),
    Big(BigInt),
    Float(f64),
}

impl NumericRepr {
    // Collapse a big integer back into the fast path when it fits.
    fn from_big(value: BigInt) -> Self {
        match value.to_i128() {
            Some(small) => Self::Int(small),
            None => Self::Big(value),
        }
    }

    fn to_big(&self) -> Option<BigInt> {
        match self {
            Self::Int(value) => Some(BigInt::from(*value)),
            Self::Big(value) => Some(value.clone()),
            Self::Float(_) => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn to_f64(&self) -> f64 {
        match self {
            Self::Int(value) => *value as f64,
            Self::Big(value) => value.to_f64().unwrap_or(f64::NAN),
            Self::Float(value) => *value,
        }
    }

    // Normalize into the narrowest integer value variant that holds it.
    fn into_value(self) -> Value {
        match self {
            Self::Int(value) => i64::try_from(value).map_or(Value::Int128(value), Value::Int),
            Self::Big(value) => match value.to_i128() {
                Some(small) => Self::Int(small).into_value(),
                None => Value::IntBig(value),
            },
            Self::Float(value) => Value::Float64(value),
        }
    }
}

///
/// Value
///
/// One cell of a shard row, one bound statement parameter, or one literal
/// sharding value. Structural equality (`==`) is variant-sensitive; use
/// [`canonical_eq`] for the width-independent semantic comparison used by
/// ordering, grouping and distinct.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Int128(i128),
    IntBig(BigInt),
    Float64(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Uint(_) | Self::Int128(_) | Self::IntBig(_) | Self::Float64(_)
        )
    }

    /// Rank used to order values of different families deterministically.
    /// Null ranks lowest so ascending order places nulls first.
    #[must_use]
    pub(crate) const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Uint(_) | Self::Int128(_) | Self::IntBig(_) | Self::Float64(_) => 2,
            Self::Text(_) => 3,
            Self::Blob(_) => 4,
        }
    }

    pub(crate) fn numeric_repr(&self) -> Option<NumericRepr> {
        match self {
            Self::Int(value) => Some(NumericRepr::Int(i128::from(*value))),
            Self::Uint(value) => Some(NumericRepr::Int(i128::from(*value))),
            Self::Int128(value) => Some(NumericRepr::Int(*value)),
            Self::IntBig(value) => Some(NumericRepr::from_big(value.clone())),
            Self::Float64(value) => Some(NumericRepr::Float(*value)),
            _ => None,
        }
    }

    /// Exact integer view of this value, including integral text such as a
    /// sharding key bound as a string parameter.
    #[must_use]
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Self::Text(text) => text.trim().parse::<BigInt>().ok(),
            Self::Float64(value) if value.is_finite() && value.fract() == 0.0 => {
                BigInt::from_f64(*value)
            }
            other => other.numeric_repr().and_then(|repr| repr.to_big()),
        }
    }

    /// Integer view narrowed to `i128`, when it fits.
    #[must_use]
    pub fn to_i128(&self) -> Option<i128> {
        self.to_integer().and_then(|value| value.to_i128())
    }

    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        self.numeric_repr().map(|repr| repr.to_f64())
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Int128(value) => write!(f, "{value}"),
            Self::IntBig(value) => write!(f, "{value}"),
            Self::Float64(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
            Self::Blob(value) => write!(f, "x'{}'", value.len()),
        }
    }
}

macro_rules! impl_value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    i128 => Int128,
    BigInt => IntBig,
    f64 => Float64,
    String => Text,
    Vec<u8> => Blob,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
