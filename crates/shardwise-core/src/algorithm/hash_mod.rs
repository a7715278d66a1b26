use crate::{
    algorithm::{AlgorithmProps, StandardShardingAlgorithm, target_for_suffix},
    error::InternalError,
    value::{Value, hash_value},
};
use num_bigint::BigInt;

///
/// HashModShardingAlgorithm
///
/// Canonical xxh3 digest of the value modulo `sharding-count`. Works for any
/// value family; numerically equal values of different widths hash alike.
///

#[derive(Clone, Debug)]
pub struct HashModShardingAlgorithm {
    count: u64,
}

impl HashModShardingAlgorithm {
    pub const SHARDING_COUNT: &'static str = "sharding-count";

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Ok(Self::new(props.require_positive(Self::SHARDING_COUNT)?))
    }
}

impl StandardShardingAlgorithm for HashModShardingAlgorithm {
    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError> {
        if value.is_null() {
            return Ok(None);
        }
        let suffix = hash_value(value).get() % u128::from(self.count);

        Ok(target_for_suffix(available, &BigInt::from(suffix)))
    }
}
