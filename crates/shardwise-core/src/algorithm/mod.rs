//! Sharding algorithms.
//!
//! Algorithms map sharding values onto a subset of the available target
//! names (data sources or actual tables). They are built by type name
//! through [`AlgorithmRegistry`] and dispatched by strategy configuration.

mod complex;
mod hash_mod;
mod hint;
mod modulo;
mod props;
mod range;

#[cfg(test)]
mod tests;

use crate::{
    error::{ConfigError, InternalError},
    value::{Value, ValueRange},
};
use num_bigint::BigInt;
use std::{collections::BTreeMap, fmt, sync::Arc};

// re-exports
pub use complex::ComplexModShardingAlgorithm;
pub use hash_mod::HashModShardingAlgorithm;
pub use hint::HintModShardingAlgorithm;
pub use modulo::ModShardingAlgorithm;
pub use props::{AlgorithmProps, PropValue};
pub use range::{BoundaryRangeShardingAlgorithm, VolumeRangeShardingAlgorithm};

///
/// StandardShardingAlgorithm
///
/// Single-column algorithm. `shard_precise` maps one equality value onto at
/// most one target; `None` means the value lives on no target.
///

pub trait StandardShardingAlgorithm: fmt::Debug + Send + Sync {
    fn shard_precise(
        &self,
        available: &[String],
        value: &Value,
    ) -> Result<Option<String>, InternalError>;

    /// Targets whose shard may hold a value in `range`.
    fn shard_range(
        &self,
        available: &[String],
        range: &ValueRange,
    ) -> Result<Vec<String>, InternalError> {
        let _ = (available, range);
        Err(InternalError::algorithm_unsupported(
            "range sharding is not supported by this algorithm",
        ))
    }

    fn supports_range(&self) -> bool {
        false
    }
}

///
/// ComplexShardingValues
///
/// All condition values of one AND-group for the columns of a complex
/// strategy, presented atomically so the algorithm sees every column at once.
///

#[derive(Clone, Debug, Default)]
pub struct ComplexShardingValues {
    pub logic_table: String,
    pub lists: BTreeMap<String, Vec<Value>>,
    pub ranges: BTreeMap<String, ValueRange>,
}

///
/// ComplexKeysShardingAlgorithm
///

pub trait ComplexKeysShardingAlgorithm: fmt::Debug + Send + Sync {
    /// Number of sharding columns this algorithm requires, when fixed.
    fn sharding_column_count(&self) -> Option<usize>;

    fn shard(
        &self,
        available: &[String],
        values: &ComplexShardingValues,
    ) -> Result<Vec<String>, InternalError>;
}

///
/// HintShardingAlgorithm
///
/// Routes by values attached to the statement instead of by predicates.
///

pub trait HintShardingAlgorithm: fmt::Debug + Send + Sync {
    fn shard(&self, available: &[String], values: &[Value]) -> Result<Vec<String>, InternalError>;
}

///
/// AlgorithmHandle
///
/// Built algorithm instance, tagged by the contract it implements.
///

#[derive(Clone, Debug)]
pub enum AlgorithmHandle {
    Standard(Arc<dyn StandardShardingAlgorithm>),
    Complex(Arc<dyn ComplexKeysShardingAlgorithm>),
    Hint(Arc<dyn HintShardingAlgorithm>),
}

impl AlgorithmHandle {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Standard(_) => "standard",
            Self::Complex(_) => "complex",
            Self::Hint(_) => "hint",
        }
    }
}

type AlgorithmFactory =
    Arc<dyn Fn(&AlgorithmProps) -> Result<AlgorithmHandle, InternalError> + Send + Sync>;

///
/// AlgorithmRegistry
///
/// Open registry of algorithm factories keyed by upper-case type name.
///

#[derive(Clone)]
pub struct AlgorithmRegistry {
    factories: BTreeMap<String, AlgorithmFactory>,
}

impl AlgorithmRegistry {
    /// Empty registry without any built-in algorithm.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in algorithm type.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register("MOD", |props| {
            Ok(AlgorithmHandle::Standard(Arc::new(
                ModShardingAlgorithm::from_props(props)?,
            )))
        });
        registry.register("HASH_MOD", |props| {
            Ok(AlgorithmHandle::Standard(Arc::new(
                HashModShardingAlgorithm::from_props(props)?,
            )))
        });
        registry.register("VOLUME_RANGE", |props| {
            Ok(AlgorithmHandle::Standard(Arc::new(
                VolumeRangeShardingAlgorithm::from_props(props)?,
            )))
        });
        registry.register("BOUNDARY_RANGE", |props| {
            Ok(AlgorithmHandle::Standard(Arc::new(
                BoundaryRangeShardingAlgorithm::from_props(props)?,
            )))
        });
        registry.register("COMPLEX_MOD", |props| {
            Ok(AlgorithmHandle::Complex(Arc::new(
                ComplexModShardingAlgorithm::from_props(props)?,
            )))
        });
        registry.register("HINT_MOD", |props| {
            Ok(AlgorithmHandle::Hint(Arc::new(
                HintModShardingAlgorithm::from_props(props)?,
            )))
        });

        registry
    }

    /// Register (or replace) a factory for `algorithm_type`.
    pub fn register<F>(&mut self, algorithm_type: &str, factory: F)
    where
        F: Fn(&AlgorithmProps) -> Result<AlgorithmHandle, InternalError> + Send + Sync + 'static,
    {
        self.factories
            .insert(algorithm_type.to_ascii_uppercase(), Arc::new(factory));
    }

    pub fn build(
        &self,
        algorithm_type: &str,
        props: &AlgorithmProps,
    ) -> Result<AlgorithmHandle, InternalError> {
        let factory = self
            .factories
            .get(&algorithm_type.to_ascii_uppercase())
            .ok_or_else(|| {
                InternalError::algorithm_config(ConfigError::UnknownAlgorithmType {
                    algorithm_type: algorithm_type.to_string(),
                })
            })?;

        factory(props)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

///
/// TARGET SUFFIX MATCHING
///

/// Numeric suffix of a target name: its trailing ASCII digits
/// (`ds_1` -> 1, `t_order_07` -> 7, `ds0` -> 0).
#[must_use]
pub fn numeric_suffix(name: &str) -> Option<u64> {
    let digits = name
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }

    name[name.len() - digits..].parse().ok()
}

/// First available target whose numeric suffix equals `suffix`.
#[must_use]
pub fn target_for_suffix(available: &[String], suffix: &BigInt) -> Option<String> {
    available
        .iter()
        .find(|name| numeric_suffix(name).is_some_and(|found| BigInt::from(found) == *suffix))
        .cloned()
}

/// Sharding values must be integers for the modulo and range families.
pub(crate) fn require_integer(value: &Value) -> Result<BigInt, InternalError> {
    value.to_integer().ok_or_else(|| {
        InternalError::algorithm_unsupported(format!(
            "sharding value {value} is not an integer"
        ))
    })
}

/// Push `target` unless already present, keeping first-seen order.
pub(crate) fn push_unique<T: PartialEq>(targets: &mut Vec<T>, target: T) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}
