//! Routing engine: picks a strategy from the statement shape and produces
//! the [`RouteContext`] the executor fans out over.

mod broadcast;
mod context;
mod sharded;


use crate::{
    condition::ShardingConditions,
    error::{ConfigError, ErrorOrigin, InternalError},
    rule::{ShardingRule, TableRule},
    statement::{StatementContext, StatementHint, StatementKind},
};
use sharded::{RouteInput, route_sharded};
use tracing::{debug, trace};

// re-exports
pub use context::{RouteContext, RouteMapper, RouteStrategyKind, RouteUnit};

/// Sharded tables of the statement, deduplicated, in statement order.
fn sharded_tables<'a>(statement: &StatementContext, rule: &'a ShardingRule) -> Vec<&'a TableRule> {
    let mut tables: Vec<&TableRule> = Vec::new();
    for name in &statement.tables {
        if let Some(table) = rule.table_rule(name)
            && !tables
                .iter()
                .any(|seen| seen.logic_table() == table.logic_table())
        {
            tables.push(table);
        }
    }

    tables
}

/// Pick the routing strategy for a statement.
///
/// Pure function of statement kind, hints and the table classification.
#[must_use]
pub fn select_strategy(statement: &StatementContext, rule: &ShardingRule) -> RouteStrategyKind {
    if matches!(statement.hint, Some(StatementHint::DataSource(_))) {
        return RouteStrategyKind::DataSourceHint;
    }

    let tables = &statement.tables;
    let any_sharded = tables.iter().any(|table| rule.is_sharded(table));
    let all_broadcast = !tables.is_empty() && tables.iter().all(|table| rule.is_broadcast(table));

    match statement.kind {
        StatementKind::Tcl => return RouteStrategyKind::DatabaseBroadcast,
        StatementKind::Ddl => {
            return if any_sharded {
                RouteStrategyKind::TableBroadcast
            } else if tables.is_empty() || all_broadcast {
                RouteStrategyKind::DatabaseBroadcast
            } else {
                RouteStrategyKind::PassThrough
            };
        }
        _ => {}
    }

    if tables.is_empty() {
        return RouteStrategyKind::Unicast;
    }
    if all_broadcast {
        return if statement.kind.is_query() {
            RouteStrategyKind::Unicast
        } else {
            RouteStrategyKind::DatabaseBroadcast
        };
    }
    if !any_sharded {
        return RouteStrategyKind::PassThrough;
    }
    if matches!(statement.hint, Some(StatementHint::Sharding { .. })) {
        return RouteStrategyKind::Hint;
    }

    let sharded = sharded_tables(statement, rule);
    let names = sharded
        .iter()
        .map(|table| table.logic_table())
        .collect::<Vec<_>>();
    if names.len() == 1 || rule.are_all_binding(&names) {
        RouteStrategyKind::Standard
    } else {
        RouteStrategyKind::Cartesian
    }
}

/// Route a statement given its extracted sharding conditions.
///
/// Range conditions narrow only when `allow_range` is set and the table's
/// algorithm supports ranges. Configuration errors surface; an empty
/// context is a valid "matches no data" outcome.
pub fn route(
    statement: &StatementContext,
    conditions: &ShardingConditions,
    rule: &ShardingRule,
    allow_range: bool,
) -> Result<RouteContext, InternalError> {
    let kind = select_strategy(statement, rule);
    debug!(
        strategy = %kind,
        tables = ?statement.tables,
        conditions = conditions.len(),
        "route strategy selected"
    );

    let context = match kind {
        RouteStrategyKind::DataSourceHint => {
            let data_source = match &statement.hint {
                Some(StatementHint::DataSource(name)) => name.as_str(),
                _ => {
                    return Err(InternalError::route_invariant(
                        "data source hint strategy without a data source hint",
                    ));
                }
            };
            broadcast::data_source_hint(statement, rule, data_source)?
        }
        RouteStrategyKind::DatabaseBroadcast => broadcast::database_broadcast(statement, rule),
        RouteStrategyKind::TableBroadcast => broadcast::table_broadcast(statement, rule),
        RouteStrategyKind::Unicast => broadcast::unicast(statement, rule),
        RouteStrategyKind::PassThrough => broadcast::pass_through(statement, rule)?,
        RouteStrategyKind::Hint => {
            let input = match &statement.hint {
                Some(StatementHint::Sharding {
                    database_values,
                    table_values,
                }) => RouteInput::Hint {
                    database_values,
                    table_values,
                },
                _ => RouteInput::Conditions(conditions),
            };
            route_sharded(kind, &sharded_tables(statement, rule), input, rule, allow_range)?
        }
        RouteStrategyKind::Standard | RouteStrategyKind::Cartesian => route_sharded(
            kind,
            &sharded_tables(statement, rule),
            RouteInput::Conditions(conditions),
            rule,
            allow_range,
        )?,
    };

    if statement.kind == StatementKind::Insert
        && matches!(
            kind,
            RouteStrategyKind::Standard | RouteStrategyKind::Cartesian | RouteStrategyKind::Hint
        )
    {
        check_insert_targets(statement, &context)?;
    }

    for unit in context.route_units() {
        trace!(unit = %unit, "route unit");
    }

    Ok(context)
}

// Every inserted row lands on exactly one data node.
fn check_insert_targets(
    statement: &StatementContext,
    context: &RouteContext,
) -> Result<(), InternalError> {
    let row_targets = if context.original_data_nodes().is_empty() {
        // unconditioned: every row goes to every unit
        vec![context.route_units().len()]
    } else {
        context
            .original_data_nodes()
            .iter()
            .map(Vec::len)
            .collect()
    };

    let Some((row, targets)) = row_targets
        .into_iter()
        .enumerate()
        .find(|(_, targets)| *targets != 1)
    else {
        return Ok(());
    };

    Err(InternalError::config(
        ErrorOrigin::Route,
        ConfigError::InsertRowTargets {
            logic_table: statement.tables.first().cloned().unwrap_or_default(),
            row,
            targets,
        },
    ))
}
