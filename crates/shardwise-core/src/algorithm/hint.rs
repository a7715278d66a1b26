use crate::{
    algorithm::{
        AlgorithmProps, HintShardingAlgorithm, ModShardingAlgorithm, push_unique, require_integer,
        target_for_suffix,
    },
    error::InternalError,
    value::Value,
};

///
/// HintModShardingAlgorithm
///
/// Modulo over hint values; each hint value selects at most one target.
///

#[derive(Clone, Debug)]
pub struct HintModShardingAlgorithm {
    count: u64,
}

impl HintModShardingAlgorithm {
    pub const SHARDING_COUNT: &'static str = "sharding-count";

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Ok(Self::new(props.require_positive(Self::SHARDING_COUNT)?))
    }
}

impl HintShardingAlgorithm for HintModShardingAlgorithm {
    fn shard(&self, available: &[String], values: &[Value]) -> Result<Vec<String>, InternalError> {
        let mut targets = Vec::new();
        for value in values.iter().filter(|value| !value.is_null()) {
            let suffix = ModShardingAlgorithm::suffix(&require_integer(value)?, self.count);
            if let Some(target) = target_for_suffix(available, &suffix) {
                push_unique(&mut targets, target);
            }
        }

        Ok(targets)
    }
}
