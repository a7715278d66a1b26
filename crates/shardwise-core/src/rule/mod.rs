//! Sharding rule model: which physical nodes hold each logical table and
//! which strategy narrows them.

mod config;
mod data_node;
mod strategy;
mod table;

#[cfg(test)]
mod tests;

use crate::{
    algorithm::{AlgorithmHandle, AlgorithmRegistry},
    error::{ConfigError, InternalError},
    value::{ValueHash, ValueHasher},
};
use std::collections::BTreeMap;

// re-exports
pub use config::{AlgorithmConfig, ShardingRuleConfig, StrategyConfig, TableRuleConfig};
pub use data_node::DataNode;
pub use strategy::{ShardingInput, ShardingStrategy};
pub use table::TableRule;

///
/// ShardingRule
///
/// Validated, immutable rule set. Logical table names are matched
/// case-insensitively; data source names are matched exactly.
///

#[derive(Clone, Debug)]
pub struct ShardingRule {
    data_sources: Vec<String>,
    default_data_source: Option<String>,
    broadcast_tables: Vec<String>,
    tables: BTreeMap<String, TableRule>,
    binding_groups: Vec<Vec<String>>,
    fingerprint: ValueHash,
}

impl ShardingRule {
    /// Build with the built-in algorithm registry.
    pub fn from_config(config: &ShardingRuleConfig) -> Result<Self, InternalError> {
        Self::from_config_with_registry(config, &AlgorithmRegistry::with_builtins())
    }

    pub fn from_config_with_registry(
        config: &ShardingRuleConfig,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, InternalError> {
        if config.data_sources.is_empty() {
            return Err(InternalError::rule_config(ConfigError::NoDataSources));
        }
        if let Some(default) = &config.default_data_source
            && !config.data_sources.contains(default)
        {
            return Err(InternalError::rule_config(ConfigError::UnknownDataSource {
                logic_table: "default_data_source".to_string(),
                data_source: default.clone(),
            }));
        }

        let mut algorithms = BTreeMap::<String, AlgorithmHandle>::new();
        for (name, algorithm) in &config.algorithms {
            algorithms.insert(
                name.clone(),
                registry.build(&algorithm.algorithm_type, &algorithm.props)?,
            );
        }

        let mut tables = BTreeMap::new();
        for table in &config.tables {
            let key = table.logic_table.to_ascii_lowercase();
            if tables.contains_key(&key) {
                return Err(InternalError::rule_config(ConfigError::DuplicateTable {
                    logic_table: table.logic_table.clone(),
                }));
            }

            let database_strategy = ShardingStrategy::from_config(
                table
                    .database_strategy
                    .as_ref()
                    .or(config.default_database_strategy.as_ref()),
                &algorithms,
            )?;
            let table_strategy = ShardingStrategy::from_config(
                table
                    .table_strategy
                    .as_ref()
                    .or(config.default_table_strategy.as_ref()),
                &algorithms,
            )?;

            let rule = TableRule::new(
                &table.logic_table,
                table.actual_data_nodes.as_deref(),
                &config.data_sources,
                database_strategy,
                table_strategy,
                table.key_generate_column.as_deref(),
            )?;
            tables.insert(key, rule);
        }

        let binding_groups = validate_binding_groups(&config.binding_table_groups, &tables)?;

        Ok(Self {
            data_sources: config.data_sources.clone(),
            default_data_source: config.default_data_source.clone(),
            broadcast_tables: config
                .broadcast_tables
                .iter()
                .map(|table| table.to_ascii_lowercase())
                .collect(),
            tables,
            binding_groups,
            fingerprint: fingerprint(config),
        })
    }

    #[must_use]
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    #[must_use]
    pub fn default_data_source(&self) -> Option<&str> {
        self.default_data_source.as_deref()
    }

    /// Data source for unsharded tables: the configured default, or the only
    /// data source when exactly one exists.
    pub fn resolve_default_data_source(&self, logic_table: &str) -> Result<&str, InternalError> {
        if let Some(default) = &self.default_data_source {
            return Ok(default);
        }
        if let [only] = self.data_sources.as_slice() {
            return Ok(only);
        }

        Err(InternalError::rule_config(
            ConfigError::NoDefaultDataSource {
                logic_table: logic_table.to_string(),
            },
        ))
    }

    #[must_use]
    pub fn table_rule(&self, logic_table: &str) -> Option<&TableRule> {
        self.tables.get(&logic_table.to_ascii_lowercase())
    }

    pub fn table_rules(&self) -> impl Iterator<Item = &TableRule> {
        self.tables.values()
    }

    #[must_use]
    pub fn is_sharded(&self, logic_table: &str) -> bool {
        self.table_rule(logic_table).is_some()
    }

    #[must_use]
    pub fn is_broadcast(&self, logic_table: &str) -> bool {
        let key = logic_table.to_ascii_lowercase();
        self.broadcast_tables.contains(&key)
    }

    /// Whether `column` is a sharding column of `logic_table`.
    #[must_use]
    pub fn is_sharding_column(&self, logic_table: &str, column: &str) -> bool {
        self.table_rule(logic_table)
            .is_some_and(|rule| rule.is_sharding_column(&column.to_ascii_lowercase()))
    }

    /// The binding group containing `logic_table`, if any.
    #[must_use]
    pub fn binding_group(&self, logic_table: &str) -> Option<&[String]> {
        let key = logic_table.to_ascii_lowercase();
        self.binding_groups
            .iter()
            .find(|group| group.contains(&key))
            .map(Vec::as_slice)
    }

    /// Whether every table belongs to one shared binding group.
    #[must_use]
    pub fn are_all_binding<S: AsRef<str>>(&self, logic_tables: &[S]) -> bool {
        let Some(first) = logic_tables.first() else {
            return false;
        };
        let Some(group) = self.binding_group(first.as_ref()) else {
            return false;
        };

        logic_tables
            .iter()
            .all(|table| group.contains(&table.as_ref().to_ascii_lowercase()))
    }

    /// Actual table of `bound_table` at the same shard index as
    /// `primary`'s node `(data_source, actual_table)`.
    pub fn binding_actual_table(
        &self,
        primary: &TableRule,
        data_source: &str,
        actual_table: &str,
        bound_table: &str,
    ) -> Result<String, InternalError> {
        let bound = self.table_rule(bound_table).ok_or_else(|| {
            InternalError::route_invariant(format!("binding table '{bound_table}' has no rule"))
        })?;
        let node = primary
            .node_index(data_source, actual_table)
            .and_then(|index| bound.data_nodes().get(index))
            .ok_or_else(|| {
                InternalError::route_invariant(format!(
                    "binding table '{bound_table}' has no node matching {data_source}.{actual_table}"
                ))
            })?;

        Ok(node.table.clone())
    }

    /// Stable digest of the rule configuration, folded into route cache keys.
    #[must_use]
    pub const fn fingerprint(&self) -> ValueHash {
        self.fingerprint
    }
}

fn validate_binding_groups(
    groups: &[Vec<String>],
    tables: &BTreeMap<String, TableRule>,
) -> Result<Vec<Vec<String>>, InternalError> {
    let mut resolved = Vec::with_capacity(groups.len());

    for group in groups {
        let mut lowered = Vec::with_capacity(group.len());
        let mut first: Option<&TableRule> = None;

        for logic_table in group {
            let key = logic_table.to_ascii_lowercase();
            let rule = tables.get(&key).ok_or_else(|| {
                InternalError::rule_config(ConfigError::UnknownBindingTable {
                    logic_table: logic_table.clone(),
                })
            })?;

            if let Some(first) = first {
                if !first.shape().eq(rule.shape()) {
                    return Err(InternalError::rule_config(
                        ConfigError::BindingShapeMismatch {
                            left: first.logic_table().to_string(),
                            right: rule.logic_table().to_string(),
                        },
                    ));
                }
            } else {
                first = Some(rule);
            }
            lowered.push(key);
        }

        resolved.push(lowered);
    }

    Ok(resolved)
}

// Digest of the full configuration. Only used for in-process cache keys, so
// the debug rendering (ordered maps, ordered vectors) is a sufficient encoding.
fn fingerprint(config: &ShardingRuleConfig) -> ValueHash {
    let mut hasher = ValueHasher::new();
    hasher.push_bytes(format!("{config:?}").as_bytes());

    hasher.finish()
}
