use crate::value::{Value, canonical_cmp};
use std::{cmp::Ordering, ops::Bound};

///
/// ValueRange
///
/// Closed, half-open or unbounded interval over canonically ordered values,
/// produced by `BETWEEN` and inequality predicates on a sharding column.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ValueRange {
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

impl ValueRange {
    #[must_use]
    pub const fn new(lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub const fn closed(lower: Value, upper: Value) -> Self {
        Self::new(Bound::Included(lower), Bound::Included(upper))
    }

    #[must_use]
    pub const fn at_least(lower: Value) -> Self {
        Self::new(Bound::Included(lower), Bound::Unbounded)
    }

    #[must_use]
    pub const fn greater_than(lower: Value) -> Self {
        Self::new(Bound::Excluded(lower), Bound::Unbounded)
    }

    #[must_use]
    pub const fn at_most(upper: Value) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(upper))
    }

    #[must_use]
    pub const fn less_than(upper: Value) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(upper))
    }

    /// Whether `value` lies inside this range. Null never does.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }

        let above_lower = match &self.lower {
            Bound::Included(lower) => canonical_cmp(value, lower) != Ordering::Less,
            Bound::Excluded(lower) => canonical_cmp(value, lower) == Ordering::Greater,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(upper) => canonical_cmp(value, upper) != Ordering::Greater,
            Bound::Excluded(upper) => canonical_cmp(value, upper) == Ordering::Less,
            Bound::Unbounded => true,
        };

        above_lower && below_upper
    }

    /// Whether no value can satisfy this range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let (lower, lower_inclusive) = match &self.lower {
            Bound::Included(value) => (value, true),
            Bound::Excluded(value) => (value, false),
            Bound::Unbounded => return false,
        };
        let (upper, upper_inclusive) = match &self.upper {
            Bound::Included(value) => (value, true),
            Bound::Excluded(value) => (value, false),
            Bound::Unbounded => return false,
        };

        match canonical_cmp(lower, upper) {
            Ordering::Greater => true,
            Ordering::Equal => !(lower_inclusive && upper_inclusive),
            Ordering::Less => false,
        }
    }

    /// Intersection of two ranges; the tighter bound wins on each side.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            lower: tighter_bound(&self.lower, &other.lower, Ordering::Greater),
            upper: tighter_bound(&self.upper, &other.upper, Ordering::Less),
        }
    }
}

// Pick the more restrictive of two bounds. `prefer` is the ordering a value
// must have relative to the other to be the tighter one (greater for lower
// bounds, less for upper bounds).
fn tighter_bound(left: &Bound<Value>, right: &Bound<Value>, prefer: Ordering) -> Bound<Value> {
    match (left, right) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (
            Bound::Included(a) | Bound::Excluded(a),
            Bound::Included(b) | Bound::Excluded(b),
        ) => match canonical_cmp(a, b) {
            Ordering::Equal => {
                if matches!(left, Bound::Excluded(_)) {
                    left.clone()
                } else {
                    right.clone()
                }
            }
            ordering if ordering == prefer => left.clone(),
            _ => right.clone(),
        },
    }
}
