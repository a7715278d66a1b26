use crate::{
    algorithm::{
        AlgorithmHandle, ComplexKeysShardingAlgorithm, ComplexShardingValues,
        HintShardingAlgorithm, StandardShardingAlgorithm, push_unique,
    },
    condition::{ConditionValues, ShardingConditionValue},
    error::{ConfigError, InternalError},
    rule::config::StrategyConfig,
    value::Value,
};
use std::{collections::BTreeMap, slice, sync::Arc};

///
/// ShardingInput
///
/// What one strategy evaluation narrows by.
///

#[derive(Clone, Copy, Debug)]
pub enum ShardingInput<'a> {
    /// No usable condition: every candidate.
    Unconditioned,

    /// Condition values of one AND-group (or insert row) for this table.
    Conditions(&'a [ShardingConditionValue]),

    /// Values attached to the statement by a sharding hint.
    Hint(&'a [Value]),
}

///
/// ShardingStrategy
///
/// Resolved strategy for one sharding dimension of one table.
///

#[derive(Clone, Debug)]
pub enum ShardingStrategy {
    Standard {
        column: String,
        algorithm_name: String,
        algorithm: Arc<dyn StandardShardingAlgorithm>,
    },
    Complex {
        columns: Vec<String>,
        algorithm_name: String,
        algorithm: Arc<dyn ComplexKeysShardingAlgorithm>,
    },
    Hint {
        algorithm_name: String,
        algorithm: Arc<dyn HintShardingAlgorithm>,
    },
    None,
}

impl ShardingStrategy {
    pub(crate) fn from_config(
        config: Option<&StrategyConfig>,
        algorithms: &BTreeMap<String, AlgorithmHandle>,
    ) -> Result<Self, InternalError> {
        let Some(config) = config else {
            return Ok(Self::None);
        };

        match config {
            StrategyConfig::Standard {
                sharding_column,
                algorithm,
            } => match lookup(algorithms, algorithm)? {
                AlgorithmHandle::Standard(handle) => Ok(Self::Standard {
                    column: sharding_column.to_ascii_lowercase(),
                    algorithm_name: algorithm.clone(),
                    algorithm: Arc::clone(handle),
                }),
                other => Err(kind_mismatch(algorithm, "standard", other)),
            },
            StrategyConfig::Complex {
                sharding_columns,
                algorithm,
            } => match lookup(algorithms, algorithm)? {
                AlgorithmHandle::Complex(handle) => {
                    if let Some(expected) = handle.sharding_column_count()
                        && expected != sharding_columns.len()
                    {
                        return Err(InternalError::algorithm_config(
                            ConfigError::ColumnCountMismatch {
                                name: algorithm.clone(),
                                expected,
                                found: sharding_columns.len(),
                            },
                        ));
                    }

                    Ok(Self::Complex {
                        columns: sharding_columns
                            .iter()
                            .map(|column| column.to_ascii_lowercase())
                            .collect(),
                        algorithm_name: algorithm.clone(),
                        algorithm: Arc::clone(handle),
                    })
                }
                other => Err(kind_mismatch(algorithm, "complex", other)),
            },
            StrategyConfig::Hint { algorithm } => match lookup(algorithms, algorithm)? {
                AlgorithmHandle::Hint(handle) => Ok(Self::Hint {
                    algorithm_name: algorithm.clone(),
                    algorithm: Arc::clone(handle),
                }),
                other => Err(kind_mismatch(algorithm, "hint", other)),
            },
            StrategyConfig::None => Ok(Self::None),
        }
    }

    /// Lower-case sharding columns of this dimension.
    #[must_use]
    pub fn sharding_columns(&self) -> &[String] {
        match self {
            Self::Standard { column, .. } => slice::from_ref(column),
            Self::Complex { columns, .. } => columns,
            Self::Hint { .. } | Self::None => &[],
        }
    }

    #[must_use]
    pub const fn is_hint(&self) -> bool {
        matches!(self, Self::Hint { .. })
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn algorithm_name(&self) -> Option<&str> {
        match self {
            Self::Standard { algorithm_name, .. }
            | Self::Complex { algorithm_name, .. }
            | Self::Hint { algorithm_name, .. } => Some(algorithm_name),
            Self::None => None,
        }
    }

    /// Narrow `available` targets for one input.
    ///
    /// Targets come back in the order the algorithm produced them. A target
    /// the algorithm invents outside `available` is a configuration error.
    pub fn shard(
        &self,
        logic_table: &str,
        available: &[String],
        input: ShardingInput<'_>,
        allow_range: bool,
    ) -> Result<Vec<String>, InternalError> {
        let targets = match (self, input) {
            (Self::None, _) | (_, ShardingInput::Unconditioned) => return Ok(available.to_vec()),

            (Self::Hint { algorithm, .. }, ShardingInput::Hint(values)) => {
                algorithm.shard(available, values)?
            }
            (Self::Hint { .. }, ShardingInput::Conditions(_)) => return Ok(available.to_vec()),

            (Self::Standard { algorithm, .. }, ShardingInput::Hint(values)) => {
                shard_precise_all(algorithm.as_ref(), available, values)?
            }
            (Self::Complex { .. }, ShardingInput::Hint(_)) => return Ok(available.to_vec()),

            (Self::Standard { column, algorithm, .. }, ShardingInput::Conditions(conditions)) => {
                let Some(condition) = conditions.iter().find(|c| c.column == *column) else {
                    return Ok(available.to_vec());
                };

                match &condition.values {
                    ConditionValues::List(values) => {
                        shard_precise_all(algorithm.as_ref(), available, values)?
                    }
                    ConditionValues::Range(range) => {
                        if allow_range && algorithm.supports_range() {
                            algorithm.shard_range(available, range)?
                        } else {
                            return Ok(available.to_vec());
                        }
                    }
                }
            }

            (Self::Complex { columns, algorithm, .. }, ShardingInput::Conditions(conditions)) => {
                let mut values = ComplexShardingValues {
                    logic_table: logic_table.to_string(),
                    ..ComplexShardingValues::default()
                };
                for condition in conditions.iter().filter(|c| columns.contains(&c.column)) {
                    match &condition.values {
                        ConditionValues::List(list) => {
                            values.lists.insert(condition.column.clone(), list.clone());
                        }
                        ConditionValues::Range(range) if allow_range => {
                            values.ranges.insert(condition.column.clone(), range.clone());
                        }
                        ConditionValues::Range(_) => {}
                    }
                }
                if values.lists.is_empty() && values.ranges.is_empty() {
                    return Ok(available.to_vec());
                }

                algorithm.shard(available, &values)?
            }
        };

        validate_targets(logic_table, available, targets)
    }
}

fn shard_precise_all(
    algorithm: &dyn StandardShardingAlgorithm,
    available: &[String],
    values: &[Value],
) -> Result<Vec<String>, InternalError> {
    let mut targets = Vec::new();
    for value in values {
        if let Some(target) = algorithm.shard_precise(available, value)? {
            push_unique(&mut targets, target);
        }
    }

    Ok(targets)
}

fn validate_targets(
    logic_table: &str,
    available: &[String],
    targets: Vec<String>,
) -> Result<Vec<String>, InternalError> {
    let mut unique = Vec::with_capacity(targets.len());
    for target in targets {
        if !available.contains(&target) {
            return Err(InternalError::algorithm_config(
                ConfigError::TargetNotAvailable {
                    logic_table: logic_table.to_string(),
                    target,
                },
            ));
        }
        push_unique(&mut unique, target);
    }

    Ok(unique)
}

fn lookup<'a>(
    algorithms: &'a BTreeMap<String, AlgorithmHandle>,
    name: &str,
) -> Result<&'a AlgorithmHandle, InternalError> {
    algorithms.get(name).ok_or_else(|| {
        InternalError::algorithm_config(ConfigError::MissingAlgorithm {
            name: name.to_string(),
        })
    })
}

fn kind_mismatch(name: &str, expected: &'static str, actual: &AlgorithmHandle) -> InternalError {
    InternalError::algorithm_config(ConfigError::AlgorithmKindMismatch {
        name: name.to_string(),
        expected,
        actual: actual.kind_name(),
    })
}
