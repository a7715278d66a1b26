use crate::{
    algorithm::{
        AlgorithmHandle, AlgorithmProps, AlgorithmRegistry, BoundaryRangeShardingAlgorithm,
        ComplexKeysShardingAlgorithm, ComplexModShardingAlgorithm, ComplexShardingValues,
        HashModShardingAlgorithm, HintModShardingAlgorithm, HintShardingAlgorithm,
        ModShardingAlgorithm, StandardShardingAlgorithm, VolumeRangeShardingAlgorithm,
        numeric_suffix,
    },
    error::{ConfigError, ErrorClass, ErrorDetail},
    value::{Value, ValueRange},
};

fn targets(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}_{i}")).collect()
}

#[test]
fn numeric_suffix_reads_trailing_digits() {
    assert_eq!(numeric_suffix("ds_1"), Some(1));
    assert_eq!(numeric_suffix("t_order_07"), Some(7));
    assert_eq!(numeric_suffix("ds0"), Some(0));
    assert_eq!(numeric_suffix("t_order"), None);
}

#[test]
fn mod_maps_values_onto_suffixes() {
    let algorithm = ModShardingAlgorithm::new(4);
    let available = targets("t_order", 4);

    let shard = |value: Value| algorithm.shard_precise(&available, &value).expect("shard");
    assert_eq!(shard(Value::Int(10)), Some("t_order_2".to_string()));
    assert_eq!(shard(Value::Uint(7)), Some("t_order_3".to_string()));
    assert_eq!(shard(Value::Int(-1)), Some("t_order_3".to_string()));
    assert_eq!(shard(Value::from("9")), Some("t_order_1".to_string()));
    assert_eq!(shard(Value::Null), None);
}

#[test]
fn mod_returns_none_when_suffix_is_not_available() {
    let algorithm = ModShardingAlgorithm::new(4);
    let available = targets("t_order", 2);

    assert_eq!(
        algorithm
            .shard_precise(&available, &Value::Int(3))
            .expect("shard"),
        None
    );
}

#[test]
fn mod_rejects_non_integer_values() {
    let algorithm = ModShardingAlgorithm::new(2);
    let err = algorithm
        .shard_precise(&targets("ds", 2), &Value::from("abc"))
        .expect_err("text is not an integer");

    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn mod_range_narrows_short_spans_only() {
    let algorithm = ModShardingAlgorithm::new(4);
    let available = targets("t", 4);

    let narrow = algorithm
        .shard_range(&available, &ValueRange::closed(Value::Int(5), Value::Int(6)))
        .expect("range");
    assert_eq!(narrow, vec!["t_1".to_string(), "t_2".to_string()]);

    let wide = algorithm
        .shard_range(&available, &ValueRange::closed(Value::Int(0), Value::Int(100)))
        .expect("range");
    assert_eq!(wide, available);

    let open = algorithm
        .shard_range(&available, &ValueRange::at_least(Value::Int(3)))
        .expect("range");
    assert_eq!(open, available);
}

#[test]
fn hash_mod_is_width_independent() {
    let algorithm = HashModShardingAlgorithm::new(8);
    let available = targets("t", 8);

    let narrow = algorithm
        .shard_precise(&available, &Value::Int(12345))
        .expect("shard");
    let wide = algorithm
        .shard_precise(&available, &Value::Int128(12345))
        .expect("shard");
    assert!(narrow.is_some());
    assert_eq!(narrow, wide);
}

#[test]
fn volume_range_partitions_by_volume() {
    let algorithm = VolumeRangeShardingAlgorithm::new(0, 30, 10).expect("algorithm");
    let available = targets("t", 5);

    let shard = |value: i64| {
        algorithm
            .shard_precise(&available, &Value::Int(value))
            .expect("shard")
    };
    assert_eq!(shard(-5), Some("t_0".to_string()));
    assert_eq!(shard(0), Some("t_1".to_string()));
    assert_eq!(shard(19), Some("t_2".to_string()));
    assert_eq!(shard(29), Some("t_3".to_string()));
    assert_eq!(shard(1_000), Some("t_4".to_string()));

    let spanning = algorithm
        .shard_range(&available, &ValueRange::closed(Value::Int(5), Value::Int(15)))
        .expect("range");
    assert_eq!(spanning, vec!["t_1".to_string(), "t_2".to_string()]);
}

#[test]
fn boundary_range_honors_exclusive_upper_bounds() {
    let algorithm = BoundaryRangeShardingAlgorithm::new(&[10, 20]).expect("algorithm");
    let available = targets("t", 3);

    let below = algorithm
        .shard_range(&available, &ValueRange::less_than(Value::Int(10)))
        .expect("range");
    assert_eq!(below, vec!["t_0".to_string()]);

    let at_boundary = algorithm
        .shard_range(&available, &ValueRange::at_most(Value::Int(10)))
        .expect("range");
    assert_eq!(at_boundary, vec!["t_0".to_string(), "t_1".to_string()]);
}

#[test]
fn boundary_range_requires_ascending_boundaries() {
    let err = BoundaryRangeShardingAlgorithm::new(&[20, 10]).expect_err("descending");

    assert!(err.is_configuration());
}

#[test]
fn complex_mod_sums_every_combination() {
    let algorithm =
        ComplexModShardingAlgorithm::new(vec!["user_id".to_string(), "order_id".to_string()], 4);
    let available = targets("t", 4);

    let mut values = ComplexShardingValues::default();
    values
        .lists
        .insert("user_id".to_string(), vec![Value::Int(1), Value::Int(2)]);
    values
        .lists
        .insert("order_id".to_string(), vec![Value::Int(10)]);

    let routed = algorithm.shard(&available, &values).expect("shard");
    assert_eq!(routed, vec!["t_3".to_string(), "t_0".to_string()]);
}

#[test]
fn complex_mod_handles_long_in_lists() {
    let columns = ["a", "b", "c"].map(ToString::to_string).to_vec();
    let algorithm = ComplexModShardingAlgorithm::new(columns, 2);
    let available = targets("t", 2);
    let list = |start: i64, step: usize| {
        (start..start + 6_000)
            .step_by(step)
            .map(Value::Int)
            .collect::<Vec<_>>()
    };

    let mut values = ComplexShardingValues::default();
    values.lists.insert("a".to_string(), list(0, 2));
    values.lists.insert("b".to_string(), list(0, 2));
    values.lists.insert("c".to_string(), list(1, 2));
    assert_eq!(
        algorithm.shard(&available, &values).expect("shard"),
        vec!["t_1".to_string()]
    );

    values.lists.insert("c".to_string(), list(0, 1));
    assert_eq!(algorithm.shard(&available, &values).expect("shard"), available);
}

#[test]
fn complex_mod_without_every_column_returns_all_targets() {
    let algorithm =
        ComplexModShardingAlgorithm::new(vec!["user_id".to_string(), "order_id".to_string()], 4);
    let available = targets("t", 4);

    let mut values = ComplexShardingValues::default();
    values
        .lists
        .insert("user_id".to_string(), vec![Value::Int(1)]);

    assert_eq!(algorithm.shard(&available, &values).expect("shard"), available);
    assert_eq!(algorithm.sharding_column_count(), Some(2));
}

#[test]
fn hint_mod_routes_each_hint_value() {
    let algorithm = HintModShardingAlgorithm::new(2);
    let routed = algorithm
        .shard(&targets("ds", 2), &[Value::Int(3), Value::Int(5), Value::Int(4)])
        .expect("shard");

    assert_eq!(routed, vec!["ds_1".to_string(), "ds_0".to_string()]);
}

#[test]
fn registry_builds_builtins_case_insensitively() {
    let registry = AlgorithmRegistry::with_builtins();
    let props = AlgorithmProps::new().with("sharding-count", 2);

    let handle = registry.build("mod", &props).expect("mod");
    assert!(matches!(handle, AlgorithmHandle::Standard(_)));

    let handle = registry.build("HINT_MOD", &props).expect("hint");
    assert_eq!(handle.kind_name(), "hint");
}

#[test]
fn registry_reports_unknown_types() {
    let err = AlgorithmRegistry::with_builtins()
        .build("INTERVAL", &AlgorithmProps::new())
        .expect_err("unknown");

    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Config(ConfigError::UnknownAlgorithmType { .. }))
    ));
}

#[test]
fn registry_accepts_custom_algorithms() {
    let mut registry = AlgorithmRegistry::empty();
    registry.register("fixed", |_| {
        Ok(AlgorithmHandle::Standard(std::sync::Arc::new(
            ModShardingAlgorithm::new(1),
        )))
    });

    assert!(registry.build("FIXED", &AlgorithmProps::new()).is_ok());
    assert!(registry.build("MOD", &AlgorithmProps::new()).is_err());
}

#[test]
fn missing_property_is_a_configuration_error() {
    let err = AlgorithmRegistry::with_builtins()
        .build("MOD", &AlgorithmProps::new())
        .expect_err("missing sharding-count");

    assert!(err.is_configuration());
    assert!(err.message.contains("sharding-count"));
}

#[test]
fn text_list_props_are_split_on_commas() {
    let props = AlgorithmProps::new().with("sharding-ranges", "1, 5,10");
    let algorithm = BoundaryRangeShardingAlgorithm::from_props(&props).expect("algorithm");

    assert_eq!(
        algorithm
            .shard_precise(&targets("t", 4), &Value::Int(7))
            .expect("shard"),
        Some("t_2".to_string())
    );
}
