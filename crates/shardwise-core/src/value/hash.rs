use crate::value::{Collation, NumericRepr, Value};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// Value-hash format version byte used by canonical digest encoding.
pub(crate) const VALUE_HASH_VERSION: u8 = 1;

/// Stable XXH3 seed used by canonical value hashing.
pub(crate) const VALUE_HASH_SEED: u64 = 0;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INTEGER: u8 = 0x02;
const TAG_INTEGER_BIG: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_TEXT: u8 = 0x05;
const TAG_BLOB: u8 = 0x06;

fn feed_u8(h: &mut Xxh3, x: u8) {
    h.update(&[x]);
}
fn feed_u32(h: &mut Xxh3, x: u32) {
    h.update(&x.to_be_bytes());
}
fn feed_i128(h: &mut Xxh3, x: i128) {
    h.update(&x.to_be_bytes());
}
fn feed_bytes(h: &mut Xxh3, b: &[u8]) {
    h.update(b);
}

///
/// ValueHash
///
/// 128-bit canonical digest of one value or one ordered value tuple.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ValueHash(u128);

impl ValueHash {
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }
}

impl fmt::Display for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

///
/// ValueHasher
///
/// Streaming canonical hasher. Values that compare equal under the canonical
/// comparator (and the same collation) always feed identical bytes, so equal
/// group keys land in the same bucket regardless of shard column widths.
///

pub struct ValueHasher {
    inner: Xxh3,
    count: u32,
}

impl ValueHasher {
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Xxh3::with_seed(VALUE_HASH_SEED);
        feed_u8(&mut inner, VALUE_HASH_VERSION);

        Self { inner, count: 0 }
    }

    pub fn push(&mut self, value: &Value, collation: Collation) {
        self.count = self.count.wrapping_add(1);
        write_to_hasher(value, collation, &mut self.inner);
    }

    #[expect(clippy::cast_possible_truncation)]
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        feed_u32(&mut self.inner, bytes.len() as u32);
        feed_bytes(&mut self.inner, bytes);
    }

    #[must_use]
    pub fn finish(mut self) -> ValueHash {
        feed_u32(&mut self.inner, self.count);

        ValueHash(self.inner.digest128())
    }
}

impl Default for ValueHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a single value under binary collation.
#[must_use]
pub fn hash_value(value: &Value) -> ValueHash {
    let mut hasher = ValueHasher::new();
    hasher.push(value, Collation::Binary);

    hasher.finish()
}

/// Hash an ordered value tuple under binary collation.
#[must_use]
pub fn hash_values(values: &[Value]) -> ValueHash {
    let mut hasher = ValueHasher::new();
    for value in values {
        hasher.push(value, Collation::Binary);
    }

    hasher.finish()
}

#[expect(clippy::cast_possible_truncation)]
fn write_to_hasher(value: &Value, collation: Collation, h: &mut Xxh3) {
    match value {
        Value::Null => feed_u8(h, TAG_NULL),
        Value::Bool(b) => {
            feed_u8(h, TAG_BOOL);
            feed_u8(h, u8::from(*b));
        }
        Value::Text(s) => {
            feed_u8(h, TAG_TEXT);
            match collation {
                Collation::Binary => {
                    feed_u32(h, s.len() as u32);
                    feed_bytes(h, s.as_bytes());
                }
                Collation::CaseInsensitive => {
                    let folded = s.chars().flat_map(char::to_lowercase).collect::<String>();
                    feed_u32(h, folded.len() as u32);
                    feed_bytes(h, folded.as_bytes());
                }
            }
        }
        Value::Blob(v) => {
            feed_u8(h, TAG_BLOB);
            feed_u32(h, v.len() as u32);
            feed_bytes(h, v);
        }
        numeric => {
            if let Some(repr) = numeric.numeric_repr() {
                write_numeric(&repr, h);
            }
        }
    }
}

// Integral numbers hash by exact magnitude so every width (and integral
// floats) agree; only fractional floats hash by bit pattern.
fn write_numeric(repr: &NumericRepr, h: &mut Xxh3) {
    match repr {
        NumericRepr::Int(i) => {
            feed_u8(h, TAG_INTEGER);
            feed_i128(h, *i);
        }
        NumericRepr::Big(v) => write_big(v, h),
        NumericRepr::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            match BigInt::from_f64(*f) {
                Some(big) => match big.to_i128() {
                    Some(small) => {
                        feed_u8(h, TAG_INTEGER);
                        feed_i128(h, small);
                    }
                    None => write_big(&big, h),
                },
                None => {
                    feed_u8(h, TAG_FLOAT);
                    feed_bytes(h, &f.to_be_bytes());
                }
            }
        }
        NumericRepr::Float(f) => {
            let canonical = if f.is_nan() { f64::NAN } else { *f };
            feed_u8(h, TAG_FLOAT);
            feed_bytes(h, &canonical.to_be_bytes());
        }
    }
}

#[expect(clippy::cast_possible_truncation)]
fn write_big(value: &BigInt, h: &mut Xxh3) {
    let bytes = value.to_signed_bytes_be();
    feed_u8(h, TAG_INTEGER_BIG);
    feed_u32(h, bytes.len() as u32);
    feed_bytes(h, &bytes);
}
