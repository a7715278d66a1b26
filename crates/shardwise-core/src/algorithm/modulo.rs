use crate::{
    algorithm::{
        AlgorithmProps, StandardShardingAlgorithm, push_unique, require_integer, target_for_suffix,
    },
    error::InternalError,
    value::{Value, ValueRange},
};
use num_bigint::BigInt;
use num_traits::Signed;
use std::ops::Bound;

///
/// ModShardingAlgorithm
///
/// `value mod sharding-count` selects the target with that numeric suffix.
///

#[derive(Clone, Debug)]
pub struct ModShardingAlgorithm {
    count: u64,
}

impl ModShardingAlgorithm {
    pub const SHARDING_COUNT: &'static str = "sharding-count";

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Ok(Self::new(props.require_positive(Self::SHARDING_COUNT)?))
    }

    pub(crate) fn suffix(value: &BigInt, count: u64) -> BigInt {
        let modulus = BigInt::from(count);
        let remainder = value % &modulus;
        if remainder.is_negative() {
            remainder + modulus
        } else {
            remainder
        }
    }
}

impl StandardShardingAlgorithm for ModShardingAlgorithm {
    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError> {
        if value.is_null() {
            return Ok(None);
        }
        let value = require_integer(value)?;

        Ok(target_for_suffix(available, &Self::suffix(&value, self.count)))
    }

    fn shard_range(
        &self,
        available: &[String],
        range: &ValueRange,
    ) -> Result<Vec<String>, InternalError> {
        let (Some(lower), Some(upper)) = (
            inclusive_lower(&range.lower)?,
            inclusive_upper(&range.upper)?,
        ) else {
            return Ok(available.to_vec());
        };
        if upper < lower {
            return Ok(Vec::new());
        }
        if &upper - &lower + 1 >= BigInt::from(self.count) {
            return Ok(available.to_vec());
        }

        let mut targets = Vec::new();
        let mut current = lower;
        while current <= upper {
            if let Some(target) = target_for_suffix(available, &Self::suffix(&current, self.count))
            {
                push_unique(&mut targets, target);
            }
            current += 1;
        }

        Ok(targets)
    }

    fn supports_range(&self) -> bool {
        true
    }
}

/// Integer lower bound made inclusive; `None` when unbounded.
pub(crate) fn inclusive_lower(bound: &Bound<Value>) -> Result<Option<BigInt>, InternalError> {
    Ok(match bound {
        Bound::Included(value) => Some(require_integer(value)?),
        Bound::Excluded(value) => Some(require_integer(value)? + 1),
        Bound::Unbounded => None,
    })
}

/// Integer upper bound made inclusive; `None` when unbounded.
pub(crate) fn inclusive_upper(bound: &Bound<Value>) -> Result<Option<BigInt>, InternalError> {
    Ok(match bound {
        Bound::Included(value) => Some(require_integer(value)?),
        Bound::Excluded(value) => Some(require_integer(value)? - 1),
        Bound::Unbounded => None,
    })
}
