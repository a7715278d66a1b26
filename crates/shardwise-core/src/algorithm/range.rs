use crate::{
    algorithm::{
        AlgorithmProps, StandardShardingAlgorithm,
        modulo::{inclusive_lower, inclusive_upper},
        push_unique, require_integer, target_for_suffix,
    },
    error::{ConfigError, InternalError},
    value::{Value, ValueRange},
};
use num_bigint::BigInt;

///
/// RangePartitions
///
/// Ascending partition boundaries. Partition 0 holds everything below the
/// first boundary; partition `i` holds `[boundary[i-1], boundary[i])`; the
/// last partition is open-ended upwards.
///

#[derive(Clone, Debug)]
struct RangePartitions {
    boundaries: Vec<BigInt>,
}

impl RangePartitions {
    fn new(boundaries: Vec<BigInt>) -> Result<Self, InternalError> {
        if boundaries.is_empty() {
            return Err(invalid("sharding-ranges", "at least one boundary is required"));
        }
        if boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(invalid(
                "sharding-ranges",
                "boundaries must be strictly ascending",
            ));
        }

        Ok(Self { boundaries })
    }

    fn partition_of(&self, value: &BigInt) -> usize {
        self.boundaries.partition_point(|boundary| boundary <= value)
    }

    const fn last_partition(&self) -> usize {
        self.boundaries.len()
    }

    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError> {
        if value.is_null() {
            return Ok(None);
        }
        let partition = self.partition_of(&require_integer(value)?);

        Ok(target_for_suffix(available, &BigInt::from(partition)))
    }

    fn shard_range(
        &self,
        available: &[String],
        range: &ValueRange,
    ) -> Result<Vec<String>, InternalError> {
        let lower = inclusive_lower(&range.lower)?;
        let upper = inclusive_upper(&range.upper)?;
        if let (Some(lower), Some(upper)) = (&lower, &upper)
            && upper < lower
        {
            return Ok(Vec::new());
        }

        let first = lower.map_or(0, |lower| self.partition_of(&lower));
        let last = upper.map_or(self.last_partition(), |upper| self.partition_of(&upper));

        let mut targets = Vec::new();
        for partition in first..=last {
            if let Some(target) = target_for_suffix(available, &BigInt::from(partition)) {
                push_unique(&mut targets, target);
            }
        }

        Ok(targets)
    }
}

///
/// VolumeRangeShardingAlgorithm
///
/// Fixed-width partitions of `sharding-volume` between `range-lower` and
/// `range-upper`, plus one open partition on each side.
///

#[derive(Clone, Debug)]
pub struct VolumeRangeShardingAlgorithm {
    partitions: RangePartitions,
}

impl VolumeRangeShardingAlgorithm {
    pub const RANGE_LOWER: &'static str = "range-lower";
    pub const RANGE_UPPER: &'static str = "range-upper";
    pub const SHARDING_VOLUME: &'static str = "sharding-volume";

    pub fn new(lower: i128, upper: i128, volume: u64) -> Result<Self, InternalError> {
        if upper <= lower {
            return Err(invalid(
                Self::RANGE_UPPER,
                "range-upper must be greater than range-lower",
            ));
        }

        let mut boundaries = Vec::new();
        let mut current = BigInt::from(lower);
        let upper = BigInt::from(upper);
        while current < upper {
            boundaries.push(current.clone());
            current += volume;
        }
        boundaries.push(upper);

        Ok(Self {
            partitions: RangePartitions::new(boundaries)?,
        })
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Self::new(
            props.require_i128(Self::RANGE_LOWER)?,
            props.require_i128(Self::RANGE_UPPER)?,
            props.require_positive(Self::SHARDING_VOLUME)?,
        )
    }
}

impl StandardShardingAlgorithm for VolumeRangeShardingAlgorithm {
    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError> {
        self.partitions.shard_precise(available, value)
    }

    fn shard_range(
        &self,
        available: &[String],
        range: &ValueRange,
    ) -> Result<Vec<String>, InternalError> {
        self.partitions.shard_range(available, range)
    }

    fn supports_range(&self) -> bool {
        true
    }
}

///
/// BoundaryRangeShardingAlgorithm
///
/// Explicit ascending `sharding-ranges` boundaries.
///

#[derive(Clone, Debug)]
pub struct BoundaryRangeShardingAlgorithm {
    partitions: RangePartitions,
}

impl BoundaryRangeShardingAlgorithm {
    pub const SHARDING_RANGES: &'static str = "sharding-ranges";

    pub fn new(boundaries: &[i128]) -> Result<Self, InternalError> {
        Ok(Self {
            partitions: RangePartitions::new(
                boundaries.iter().copied().map(BigInt::from).collect(),
            )?,
        })
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Self::new(&props.require_i128_list(Self::SHARDING_RANGES)?)
    }
}

impl StandardShardingAlgorithm for BoundaryRangeShardingAlgorithm {
    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError> {
        self.partitions.shard_precise(available, value)
    }

    fn shard_range(
        &self,
        available: &[String],
        range: &ValueRange,
    ) -> Result<Vec<String>, InternalError> {
        self.partitions.shard_range(available, range)
    }

    fn supports_range(&self) -> bool {
        true
    }
}

fn invalid(property: &str, reason: &str) -> InternalError {
    InternalError::algorithm_config(ConfigError::InvalidProperty {
        property: property.to_string(),
        reason: reason.to_string(),
    })
}
