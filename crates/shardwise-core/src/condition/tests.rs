use crate::{
    condition::{ConditionValues, ShardingConditionValue, extract, routing_parameter_indexes},
    statement::{
        ColumnRef, CompareOp, Expr, GeneratedKeys, InsertValues, Operand, StatementContext,
        StatementHint, StatementKind,
    },
    test_support::rule,
    value::{Value, ValueRange},
};

fn list(table: &str, column: &str, values: &[i64]) -> ShardingConditionValue {
    ShardingConditionValue {
        table: table.to_string(),
        column: column.to_string(),
        values: ConditionValues::List(values.iter().copied().map(Value::Int).collect()),
    }
}

fn order_select(expr: Expr) -> StatementContext {
    StatementContext::select("SELECT * FROM t_order WHERE ...")
        .with_tables(&["t_order"])
        .with_where(expr)
}

// ---- insert ------------------------------------------------------------

#[test]
fn insert_rows_yield_one_condition_each() {
    let values = InsertValues {
        columns: vec!["user_id".into(), "order_id".into(), "status".into()],
        rows: vec![
            vec![
                Operand::literal(10),
                Operand::param(0),
                Operand::literal("new"),
            ],
            vec![
                Operand::literal(11),
                Operand::param(1),
                Operand::literal("new"),
            ],
        ],
        generated_keys: None,
    };
    let statement = StatementContext::insert("INSERT ...", "t_order", values);

    let conditions = extract(&statement, &[Value::Int(1), Value::Int(2)], &rule()).expect("ok");

    assert_eq!(conditions.len(), 2);
    assert_eq!(
        conditions[0].values,
        vec![
            list("t_order", "user_id", &[10]),
            list("t_order", "order_id", &[1])
        ]
    );
    assert_eq!(
        conditions[1].values,
        vec![
            list("t_order", "user_id", &[11]),
            list("t_order", "order_id", &[2])
        ]
    );
}

#[test]
fn insert_uses_generated_keys_for_missing_sharding_column() {
    let values = InsertValues {
        columns: vec!["USER_ID".into()],
        rows: vec![vec![Operand::literal(1)], vec![Operand::literal(2)]],
        generated_keys: Some(GeneratedKeys {
            column: "order_id".into(),
            values: vec![Value::Int(100), Value::Int(101)],
        }),
    };
    let statement = StatementContext::insert("INSERT ...", "T_ORDER", values);

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(conditions[1].values[1], list("t_order", "order_id", &[101]));
}

#[test]
fn insert_without_sharding_values_is_unconditioned() {
    let values = InsertValues {
        columns: vec!["status".into()],
        rows: vec![vec![Operand::literal("x")]],
        generated_keys: None,
    };
    let statement = StatementContext::insert("INSERT ...", "t_order", values);

    assert!(extract(&statement, &[], &rule()).expect("ok").is_empty());
}

// ---- where -------------------------------------------------------------

#[test]
fn and_predicates_collect_per_column() {
    let statement = order_select(Expr::and(vec![
        Expr::equals("user_id", Operand::param(0)),
        Expr::in_list("order_id", vec![Operand::literal(1), Operand::literal(2)]),
        Expr::equals("status", Operand::literal("paid")),
    ]));

    let conditions = extract(&statement, &[Value::Int(7)], &rule()).expect("ok");

    assert_eq!(conditions.len(), 1);
    assert_eq!(
        conditions[0].values,
        vec![
            list("t_order", "user_id", &[7]),
            list("t_order", "order_id", &[1, 2])
        ]
    );
}

#[test]
fn or_predicates_yield_one_condition_per_group() {
    let statement = order_select(Expr::or(vec![
        Expr::equals("order_id", Operand::literal(1)),
        Expr::equals("order_id", Operand::literal(2)),
    ]));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[1].values, vec![list("t_order", "order_id", &[2])]);
}

#[test]
fn contradictory_equalities_are_always_false() {
    let statement = order_select(Expr::and(vec![
        Expr::equals("order_id", Operand::literal(1)),
        Expr::equals("order_id", Operand::literal(2)),
    ]));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(conditions.len(), 1);
    assert!(conditions[0].always_false);
    assert!(conditions.is_always_false());
}

#[test]
fn list_and_range_intersect() {
    let statement = order_select(Expr::and(vec![
        Expr::in_list(
            "order_id",
            vec![
                Operand::literal(1),
                Operand::literal(5),
                Operand::literal(9),
            ],
        ),
        Expr::between("order_id", Operand::literal(2), Operand::literal(9)),
    ]));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(conditions[0].values, vec![list("t_order", "order_id", &[5, 9])]);
}

#[test]
fn inequalities_become_ranges() {
    let statement = order_select(Expr::and(vec![
        Expr::compare(
            ColumnRef::new("order_id"),
            CompareOp::Ge,
            Operand::literal(10),
        ),
        Expr::compare(
            ColumnRef::new("order_id"),
            CompareOp::Lt,
            Operand::literal(20),
        ),
    ]));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    let expected = ValueRange::at_least(Value::Int(10))
        .intersect(&ValueRange::less_than(Value::Int(20)));
    assert_eq!(
        conditions[0].values[0].values,
        ConditionValues::Range(expected)
    );
}

#[test]
fn group_without_sharding_values_makes_statement_unconditioned() {
    let statement = order_select(Expr::or(vec![
        Expr::equals("order_id", Operand::literal(1)),
        Expr::equals("status", Operand::literal("paid")),
    ]));

    assert!(extract(&statement, &[], &rule()).expect("ok").is_empty());
}

#[test]
fn not_equal_and_opaque_do_not_narrow() {
    let statement = order_select(Expr::and(vec![
        Expr::compare(
            ColumnRef::new("order_id"),
            CompareOp::Ne,
            Operand::literal(1),
        ),
        Expr::Opaque,
    ]));

    assert!(extract(&statement, &[], &rule()).expect("ok").is_empty());
}

#[test]
fn unqualified_column_applies_to_every_owning_table() {
    let statement = StatementContext::select("SELECT ... JOIN ...")
        .with_tables(&["t_order", "t_order_item"])
        .with_where(Expr::equals("order_id", Operand::literal(3)));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(
        conditions[0].values,
        vec![
            list("t_order", "order_id", &[3]),
            list("t_order_item", "order_id", &[3])
        ]
    );
    assert_eq!(conditions[0].values_for("T_ORDER_ITEM").len(), 1);
}

#[test]
fn qualified_column_applies_to_its_table_only() {
    let statement = StatementContext::select("SELECT ... JOIN ...")
        .with_tables(&["t_order", "t_order_item"])
        .with_where(Expr::compare(
            ColumnRef::qualified("t_order_item", "order_id"),
            CompareOp::Eq,
            Operand::literal(3),
        ));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(
        conditions[0].values,
        vec![list("t_order_item", "order_id", &[3])]
    );
}

#[test]
fn subquery_predicates_join_the_where_clause() {
    let statement = order_select(Expr::equals("user_id", Operand::literal(1)))
        .with_subquery_predicate(Expr::equals("order_id", Operand::literal(4)));

    let conditions = extract(&statement, &[], &rule()).expect("ok");

    assert_eq!(conditions[0].values.len(), 2);
}

#[test]
fn unbound_parameter_is_an_error() {
    let statement = order_select(Expr::equals("order_id", Operand::param(3)));

    let err = extract(&statement, &[Value::Int(1)], &rule()).expect_err("unbound");
    assert!(err.message.contains("parameter marker 3"));
}

#[test]
fn hinted_and_ddl_statements_are_unconditioned() {
    let hinted = order_select(Expr::equals("order_id", Operand::literal(1)))
        .with_hint(StatementHint::DataSource("ds_1".into()));
    assert!(extract(&hinted, &[], &rule()).expect("ok").is_empty());

    let ddl = StatementContext::new(StatementKind::Ddl, "ALTER TABLE t_order ...")
        .with_tables(&["t_order"]);
    assert!(extract(&ddl, &[], &rule()).expect("ok").is_empty());
}

#[test]
fn routing_parameters_cover_where_and_insert_positions() {
    let select = order_select(Expr::and(vec![
        Expr::equals("user_id", Operand::param(2)),
        Expr::equals("status", Operand::param(0)),
        Expr::in_list("order_id", vec![Operand::param(1), Operand::param(2)]),
    ]));
    assert_eq!(routing_parameter_indexes(&select, &rule()), vec![1, 2]);

    let insert = StatementContext::insert(
        "INSERT ...",
        "t_order",
        InsertValues {
            columns: vec!["status".into(), "order_id".into()],
            rows: vec![vec![Operand::param(0), Operand::param(1)]],
            generated_keys: None,
        },
    );
    assert_eq!(routing_parameter_indexes(&insert, &rule()), vec![1]);
}
