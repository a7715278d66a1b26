use crate::{
    algorithm::AlgorithmProps,
    error::{ConfigError, ErrorDetail, InternalError},
    rule::{
        AlgorithmConfig, DataNode, ShardingRule, StrategyConfig, TableRuleConfig,
        data_node::{expand_data_nodes, expand_inline},
    },
    test_support::{rule, rule_config},
};

fn config_error(err: InternalError) -> ConfigError {
    assert!(err.is_configuration(), "expected configuration error: {err:?}");
    match err.detail {
        Some(ErrorDetail::Config(detail)) => detail,
        None => panic!("configuration error without detail"),
    }
}

// ---- inline expressions ------------------------------------------------

#[test]
fn inline_ranges_expand_left_group_outermost() {
    let nodes = expand_data_nodes("ds_${0..1}.t_${0..2}").expect("nodes");
    let rendered = nodes.iter().map(ToString::to_string).collect::<Vec<_>>();

    assert_eq!(
        rendered,
        vec![
            "ds_0.t_0", "ds_0.t_1", "ds_0.t_2", "ds_1.t_0", "ds_1.t_1", "ds_1.t_2",
        ]
    );
}

#[test]
fn inline_lists_and_plain_items_mix() {
    let items = expand_inline("ds_${['a', 'b']}.t_x, ds_c.t_y").expect("items");

    assert_eq!(items, vec!["ds_a.t_x", "ds_b.t_x", "ds_c.t_y"]);
}

#[test]
fn inline_ranges_keep_zero_padding() {
    let items = expand_inline("t_${00..02}").expect("items");

    assert_eq!(items, vec!["t_00", "t_01", "t_02"]);
}

#[test]
fn malformed_expressions_are_rejected() {
    for expression in ["ds_${0..1.t", "ds_${x}.t", "ds_${3..1}.t", "no_dot", "ds.", ""] {
        let err = expand_data_nodes(expression).expect_err(expression);
        assert!(
            matches!(config_error(err), ConfigError::InvalidDataNodes { .. }),
            "{expression}"
        );
    }
}

// ---- rule resolution ---------------------------------------------------

#[test]
fn table_rule_groups_tables_by_data_source() {
    let rule = rule();
    let order = rule.table_rule("T_ORDER").expect("case-insensitive lookup");

    assert_eq!(order.data_sources(), ["ds_0", "ds_1"]);
    assert_eq!(order.actual_tables("ds_1"), ["t_order_0", "t_order_1"]);
    assert!(order.actual_tables("ds_9").is_empty());
    assert_eq!(order.sharding_columns(), vec!["user_id", "order_id"]);
    assert_eq!(order.key_generate_column(), Some("order_id"));
}

#[test]
fn default_strategies_are_inherited() {
    let rule = rule();
    let user = rule.table_rule("t_user").expect("t_user");

    assert_eq!(user.database_strategy().algorithm_name(), Some("database_mod"));
    assert!(user.table_strategy().is_none());
    assert!(rule.is_sharding_column("t_user", "USER_ID"));
    assert!(!rule.is_sharding_column("t_user", "order_id"));
}

#[test]
fn table_without_nodes_lives_on_every_data_source() {
    let mut config = rule_config();
    config.tables.push(TableRuleConfig::new("t_audit"));
    let rule = ShardingRule::from_config(&config).expect("rule");

    assert_eq!(
        rule.table_rule("t_audit").expect("t_audit").data_nodes(),
        [DataNode::new("ds_0", "t_audit"), DataNode::new("ds_1", "t_audit")]
    );
}

#[test]
fn broadcast_and_binding_lookups() {
    let rule = rule();

    assert!(rule.is_broadcast("T_CONFIG"));
    assert!(!rule.is_sharded("t_config"));
    assert!(rule.are_all_binding(&["t_order", "t_order_item"]));
    assert!(!rule.are_all_binding(&["t_order", "t_user"]));
    assert!(!rule.are_all_binding::<&str>(&[]));

    let order = rule.table_rule("t_order").expect("t_order");
    assert_eq!(
        rule.binding_actual_table(order, "ds_1", "t_order_1", "t_order_item")
            .expect("bound"),
        "t_order_item_1"
    );
}

#[test]
fn default_data_source_resolution() {
    let rule = rule();
    assert_eq!(rule.resolve_default_data_source("t_log").expect("ds"), "ds_0");

    let mut config = rule_config();
    config.default_data_source = None;
    let rule = ShardingRule::from_config(&config).expect("rule");
    let err = rule
        .resolve_default_data_source("t_log")
        .expect_err("two data sources and no default");
    assert!(matches!(
        config_error(err),
        ConfigError::NoDefaultDataSource { .. }
    ));

    config.data_sources.truncate(1);
    config.tables.clear();
    config.binding_table_groups.clear();
    let rule = ShardingRule::from_config(&config).expect("rule");
    assert_eq!(rule.resolve_default_data_source("t_log").expect("ds"), "ds_0");
}

#[test]
fn fingerprint_tracks_configuration_changes() {
    let base = rule().fingerprint();
    assert_eq!(rule().fingerprint(), base);

    let mut config = rule_config();
    config.broadcast_tables.push("t_dict".to_string());
    let changed = ShardingRule::from_config(&config).expect("rule").fingerprint();
    assert_ne!(changed, base);
}

// ---- validation --------------------------------------------------------

#[test]
fn missing_algorithm_is_rejected() {
    let mut config = rule_config();
    config.algorithms.remove("table_mod");

    let err = ShardingRule::from_config(&config).expect_err("missing algorithm");
    assert_eq!(
        config_error(err),
        ConfigError::MissingAlgorithm {
            name: "table_mod".to_string()
        }
    );
}

#[test]
fn algorithm_kind_must_match_strategy() {
    let mut config = rule_config();
    config.algorithms.insert(
        "table_mod".to_string(),
        AlgorithmConfig::new("HINT_MOD", AlgorithmProps::new().with("sharding-count", 2)),
    );

    let err = ShardingRule::from_config(&config).expect_err("kind mismatch");
    assert!(matches!(
        config_error(err),
        ConfigError::AlgorithmKindMismatch {
            expected: "standard",
            actual: "hint",
            ..
        }
    ));
}

#[test]
fn complex_column_count_must_match() {
    let mut config = rule_config();
    config.algorithms.insert(
        "complex".to_string(),
        AlgorithmConfig::new(
            "COMPLEX_MOD",
            AlgorithmProps::new()
                .with("sharding-columns", "user_id, order_id")
                .with("sharding-count", 2),
        ),
    );
    config.tables.push(
        TableRuleConfig::new("t_pay")
            .with_nodes("ds_${0..1}.t_pay_${0..1}")
            .with_table_strategy(StrategyConfig::complex(&["order_id"], "complex")),
    );

    let err = ShardingRule::from_config(&config).expect_err("column count mismatch");
    assert_eq!(
        config_error(err),
        ConfigError::ColumnCountMismatch {
            name: "complex".to_string(),
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn unknown_data_source_in_nodes_is_rejected() {
    let mut config = rule_config();
    config.tables[2] = TableRuleConfig::new("t_user").with_nodes("ds_${0..2}.t_user");

    let err = ShardingRule::from_config(&config).expect_err("ds_2 is not configured");
    assert!(matches!(
        config_error(err),
        ConfigError::UnknownDataSource { data_source, .. } if data_source == "ds_2"
    ));
}

#[test]
fn empty_data_sources_are_rejected() {
    let mut config = rule_config();
    config.data_sources.clear();

    let err = ShardingRule::from_config(&config).expect_err("no data sources");
    assert_eq!(config_error(err), ConfigError::NoDataSources);
}

#[test]
fn duplicate_tables_are_rejected() {
    let mut config = rule_config();
    config.tables.push(TableRuleConfig::new("T_ORDER"));

    let err = ShardingRule::from_config(&config).expect_err("duplicate");
    assert!(matches!(
        config_error(err),
        ConfigError::DuplicateTable { .. }
    ));
}

#[test]
fn binding_groups_require_known_tables_with_equal_shapes() {
    let mut config = rule_config();
    config.binding_table_groups = vec![vec!["t_order".to_string(), "t_missing".to_string()]];
    let err = ShardingRule::from_config(&config).expect_err("unknown binding table");
    assert!(matches!(
        config_error(err),
        ConfigError::UnknownBindingTable { .. }
    ));

    config.binding_table_groups = vec![vec!["t_order".to_string(), "t_user".to_string()]];
    let err = ShardingRule::from_config(&config).expect_err("shape mismatch");
    assert!(matches!(
        config_error(err),
        ConfigError::BindingShapeMismatch { .. }
    ));
}
