use shardwise::{
    ShardwiseConfig,
    core::{
        merge::{MemoryQueryResult, QueryResult, reassemble_generated_keys},
        route::RouteStrategyKind,
        statement::{
            Expr, GeneratedKeys, InsertValues, Operand, Projection, StatementContext,
        },
        value::Value,
    },
    error::{ErrorKind, ErrorOrigin},
};

const CONFIG: &str = r#"
[rule]
data_sources = ["ds_0", "ds_1"]
default_data_source = "ds_0"
broadcast_tables = ["t_config"]
binding_table_groups = [["t_order", "t_order_item"]]

[rule.default_database_strategy]
type = "standard"
sharding_column = "user_id"
algorithm = "database_mod"

[[rule.tables]]
logic_table = "t_order"
actual_data_nodes = "ds_${0..1}.t_order_${0..1}"
key_generate_column = "order_id"

[rule.tables.table_strategy]
type = "standard"
sharding_column = "order_id"
algorithm = "table_mod"

[[rule.tables]]
logic_table = "t_order_item"
actual_data_nodes = "ds_${0..1}.t_order_item_${0..1}"

[rule.tables.table_strategy]
type = "standard"
sharding_column = "order_id"
algorithm = "table_mod"

[[rule.tables]]
logic_table = "t_log"
actual_data_nodes = "ds_0.t_log_${0..2}"

[rule.tables.database_strategy]
type = "none"

[rule.tables.table_strategy]
type = "standard"
sharding_column = "log_id"
algorithm = "log_range"

[rule.algorithms.database_mod]
type = "MOD"
props = { sharding-count = 2 }

[rule.algorithms.table_mod]
type = "MOD"
props = { sharding-count = 2 }

[rule.algorithms.log_range]
type = "BOUNDARY_RANGE"
props = { sharding-ranges = "10, 20" }

[engine]
allow_range_conditions = true

[engine.route_cache]
capacity = 16
"#;

fn config() -> ShardwiseConfig {
    ShardwiseConfig::from_toml_str(CONFIG).expect("config parses")
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

#[test]
fn toml_config_routes_to_a_single_node() {
    let engine = config().build_engine().expect("engine");
    let statement = StatementContext::select(
        "SELECT * FROM t_order WHERE user_id = ? AND order_id = ?",
    )
    .with_tables(&["t_order"])
    .with_where(Expr::and(vec![
        Expr::equals("user_id", Operand::param(0)),
        Expr::equals("order_id", Operand::param(1)),
    ]))
    .with_parameter_markers(2);

    let context = engine
        .resolve_route(&statement, &ints(&[1, 3]))
        .expect("route");

    assert_eq!(context.strategy(), RouteStrategyKind::Standard);
    assert_eq!(context.route_units().len(), 1);
    let unit = &context.route_units()[0];
    assert_eq!(unit.data_source(), "ds_1");
    assert_eq!(unit.actual_table("t_order"), Some("t_order_1"));
    assert_eq!(engine.cache().map(|cache| cache.len()), Some(1));
}

#[test]
fn range_predicates_narrow_only_when_enabled() {
    let statement = StatementContext::select("SELECT * FROM t_log WHERE log_id BETWEEN 12 AND 15")
        .with_tables(&["t_log"])
        .with_where(Expr::between(
            "log_id",
            Operand::literal(12),
            Operand::literal(15),
        ));

    let narrowed = config()
        .build_engine()
        .expect("engine")
        .route(&statement, &[])
        .expect("route");
    assert_eq!(narrowed.route_units().len(), 1);
    assert_eq!(
        narrowed.route_units()[0].actual_table("t_log"),
        Some("t_log_1")
    );

    let mut strict = config();
    strict.engine.allow_range_conditions = false;
    let full = strict
        .build_engine()
        .expect("engine")
        .route(&statement, &[])
        .expect("route");
    assert_eq!(full.route_units().len(), 3);
}

#[test]
fn generated_keys_come_back_in_row_order() {
    let engine = config().build_engine().expect("engine");
    let statement = StatementContext::insert(
        "INSERT INTO t_order (user_id) VALUES (?), (?), (?)",
        "t_order",
        InsertValues {
            columns: vec!["user_id".into()],
            rows: vec![
                vec![Operand::param(0)],
                vec![Operand::param(1)],
                vec![Operand::param(2)],
            ],
            generated_keys: Some(GeneratedKeys {
                column: "order_id".into(),
                values: ints(&[10, 11, 12]),
            }),
        },
    )
    .with_parameter_markers(3);

    let context = engine
        .resolve_route(&statement, &ints(&[0, 1, 0]))
        .expect("route");

    let units: Vec<String> = context
        .route_units()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(units.len(), 2);
    assert_eq!(context.original_data_nodes().len(), 3);

    // ds_0.t_order_0 received rows 0 and 2, ds_1.t_order_1 row 1.
    let unit_keys: Vec<Vec<Value>> = context
        .route_units()
        .iter()
        .map(|unit| match unit.data_source() {
            "ds_0" => ints(&[10, 12]),
            _ => ints(&[11]),
        })
        .collect();
    let keys = reassemble_generated_keys(&context, &unit_keys).expect("keys");

    assert_eq!(keys, ints(&[10, 11, 12]));
}

#[test]
fn engine_merges_partial_averages() {
    let engine = config().build_engine().expect("engine");
    let statement = StatementContext::select("SELECT AVG(amount) FROM t_order")
        .with_tables(&["t_order"])
        .with_projections(vec![
            Projection::avg("avg_amount", 1, 2),
            Projection::column("sum_amount"),
            Projection::column("count_amount"),
        ]);
    let results: Vec<Box<dyn QueryResult>> = vec![
        Box::new(MemoryQueryResult::of_ints(&[&[10, 30, 3]])),
        Box::new(MemoryQueryResult::of_ints(&[&[25, 50, 2]])),
    ];

    let mut merged = engine.merge(&statement, results, &[]).expect("merge");

    assert!(merged.next().expect("next"));
    assert_eq!(merged.value(0).expect("avg"), &Value::Float64(16.0));
    assert!(!merged.next().expect("next"));
}

#[test]
fn unknown_algorithm_is_a_configuration_error() {
    let source = CONFIG.replace("algorithm = \"log_range\"", "algorithm = \"missing\"");
    let err = ShardwiseConfig::from_toml_str(&source)
        .expect("config parses")
        .build_engine()
        .expect_err("unknown algorithm");

    assert!(err.is_configuration());
    assert!(err.message.contains("missing"), "{}", err.message);
}

#[test]
fn malformed_toml_is_a_configuration_error() {
    let err = ShardwiseConfig::from_toml_str("[rule\ndata_sources = 1").expect_err("invalid toml");

    assert_eq!(err.kind, ErrorKind::Configuration);
    assert_eq!(err.origin, ErrorOrigin::Config);
}

#[test]
fn unknown_engine_keys_are_rejected() {
    let err = ShardwiseConfig::from_toml_str("[engine]\nroute_cahce = true")
        .expect_err("typo must not pass");

    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = ShardwiseConfig::from_path("/nonexistent/shardwise.toml").expect_err("no file");

    assert_eq!(err.kind, ErrorKind::Io);
}

#[test]
fn errors_serialize_with_stable_labels() {
    let err = ShardwiseConfig::from_toml_str("[rule]\ndata_sources = []")
        .expect("config parses")
        .build_rule()
        .expect_err("no data sources");

    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["kind"], "Configuration");
    assert_eq!(json["origin"], "Rule");
}
