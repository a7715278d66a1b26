//! Shared fixtures for unit tests.

use crate::{
    algorithm::AlgorithmProps,
    rule::{AlgorithmConfig, ShardingRule, ShardingRuleConfig, StrategyConfig, TableRuleConfig},
};

/// Two data sources, two tables each:
///
/// - `t_order` / `t_order_item`: bound, database by `user_id mod 2`, table by
///   `order_id mod 2`
/// - `t_user`: database by `user_id mod 2`, one table per data source
/// - `t_config`: broadcast
/// - `t_log`: unsharded
pub(crate) fn rule_config() -> ShardingRuleConfig {
    let modulo = |count: i64| {
        AlgorithmConfig::new("MOD", AlgorithmProps::new().with("sharding-count", count))
    };

    ShardingRuleConfig {
        data_sources: vec!["ds_0".to_string(), "ds_1".to_string()],
        default_data_source: Some("ds_0".to_string()),
        broadcast_tables: vec!["t_config".to_string()],
        binding_table_groups: vec![vec!["t_order".to_string(), "t_order_item".to_string()]],
        tables: vec![
            TableRuleConfig::new("t_order")
                .with_nodes("ds_${0..1}.t_order_${0..1}")
                .with_table_strategy(StrategyConfig::standard("order_id", "table_mod"))
                .with_key_generate_column("order_id"),
            TableRuleConfig::new("t_order_item")
                .with_nodes("ds_${0..1}.t_order_item_${0..1}")
                .with_table_strategy(StrategyConfig::standard("order_id", "table_mod")),
            TableRuleConfig::new("t_user").with_nodes("ds_${0..1}.t_user"),
        ],
        default_database_strategy: Some(StrategyConfig::standard("user_id", "database_mod")),
        default_table_strategy: None,
        algorithms: [
            ("database_mod".to_string(), modulo(2)),
            ("table_mod".to_string(), modulo(2)),
        ]
        .into_iter()
        .collect(),
    }
}

pub(crate) fn rule() -> ShardingRule {
    ShardingRule::from_config(&rule_config()).expect("fixture rule is valid")
}
