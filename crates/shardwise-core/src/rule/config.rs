use crate::algorithm::AlgorithmProps;
use serde::Deserialize;
use std::collections::BTreeMap;

///
/// ShardingRuleConfig
///
/// Declarative rule set, typically deserialized from TOML. Validated and
/// resolved into a [`ShardingRule`](crate::rule::ShardingRule) by
/// `ShardingRule::from_config`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShardingRuleConfig {
    pub data_sources: Vec<String>,
    pub default_data_source: Option<String>,
    pub broadcast_tables: Vec<String>,
    pub binding_table_groups: Vec<Vec<String>>,
    pub tables: Vec<TableRuleConfig>,
    pub default_database_strategy: Option<StrategyConfig>,
    pub default_table_strategy: Option<StrategyConfig>,
    pub algorithms: BTreeMap<String, AlgorithmConfig>,
}

///
/// TableRuleConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TableRuleConfig {
    pub logic_table: String,

    /// Inline expression such as `ds_${0..1}.t_order_${0..3}`.
    pub actual_data_nodes: Option<String>,
    pub database_strategy: Option<StrategyConfig>,
    pub table_strategy: Option<StrategyConfig>,
    pub key_generate_column: Option<String>,
}

impl TableRuleConfig {
    #[must_use]
    pub fn new(logic_table: &str) -> Self {
        Self {
            logic_table: logic_table.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_nodes(mut self, expression: &str) -> Self {
        self.actual_data_nodes = Some(expression.to_string());
        self
    }

    #[must_use]
    pub fn with_database_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.database_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn with_table_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.table_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn with_key_generate_column(mut self, column: &str) -> Self {
        self.key_generate_column = Some(column.to_string());
        self
    }
}

///
/// StrategyConfig
///
/// One sharding dimension (database or table). `None` disables sharding on
/// that dimension even when a rule-level default exists.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum StrategyConfig {
    Standard {
        sharding_column: String,
        algorithm: String,
    },
    Complex {
        sharding_columns: Vec<String>,
        algorithm: String,
    },
    Hint {
        algorithm: String,
    },
    None,
}

impl StrategyConfig {
    #[must_use]
    pub fn standard(column: &str, algorithm: &str) -> Self {
        Self::Standard {
            sharding_column: column.to_string(),
            algorithm: algorithm.to_string(),
        }
    }

    #[must_use]
    pub fn complex(columns: &[&str], algorithm: &str) -> Self {
        Self::Complex {
            sharding_columns: columns.iter().map(ToString::to_string).collect(),
            algorithm: algorithm.to_string(),
        }
    }

    #[must_use]
    pub fn hint(algorithm: &str) -> Self {
        Self::Hint {
            algorithm: algorithm.to_string(),
        }
    }
}

///
/// AlgorithmConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlgorithmConfig {
    #[serde(rename = "type")]
    pub algorithm_type: String,

    #[serde(default)]
    pub props: AlgorithmProps,
}

impl AlgorithmConfig {
    #[must_use]
    pub fn new(algorithm_type: &str, props: AlgorithmProps) -> Self {
        Self {
            algorithm_type: algorithm_type.to_string(),
            props,
        }
    }
}
