//! Routing that does not evaluate sharding algorithms: broadcasts, unicast,
//! pass-through to the default data source and data-source hints.

use crate::{
    error::{ConfigError, InternalError},
    route::{RouteContext, RouteMapper, RouteStrategyKind, RouteUnit},
    rule::ShardingRule,
    statement::StatementContext,
};

// Statement tables mapped to themselves, first spelling wins.
fn identity_mappers(statement: &StatementContext) -> Vec<RouteMapper> {
    let mut mappers: Vec<RouteMapper> = Vec::new();
    for table in &statement.tables {
        if !mappers
            .iter()
            .any(|mapper| mapper.logic_name.eq_ignore_ascii_case(table))
        {
            mappers.push(RouteMapper::identity(table));
        }
    }

    mappers
}

fn single_unit(kind: RouteStrategyKind, statement: &StatementContext, data_source: &str) -> RouteContext {
    let mut context = RouteContext::new(kind);
    context.push_unit(RouteUnit::new(
        RouteMapper::identity(data_source),
        identity_mappers(statement),
    ));

    context
}

/// One unit per configured data source.
pub(crate) fn database_broadcast(statement: &StatementContext, rule: &ShardingRule) -> RouteContext {
    let mappers = identity_mappers(statement);
    let mut context = RouteContext::new(RouteStrategyKind::DatabaseBroadcast);
    for data_source in rule.data_sources() {
        context.push_unit(RouteUnit::new(
            RouteMapper::identity(data_source),
            mappers.clone(),
        ));
    }

    context
}

/// One unit per data source holding a sharded statement table, carrying
/// every actual table there. Broadcast tables ride along unmapped.
pub(crate) fn table_broadcast(statement: &StatementContext, rule: &ShardingRule) -> RouteContext {
    let mut context = RouteContext::new(RouteStrategyKind::TableBroadcast);

    for data_source in rule.data_sources() {
        let mut mappers = Vec::new();
        let mut sharded = false;

        for table in &statement.tables {
            if let Some(table_rule) = rule.table_rule(table) {
                for actual in table_rule.actual_tables(data_source) {
                    sharded = true;
                    mappers.push(RouteMapper::new(table_rule.logic_table(), actual.as_str()));
                }
            } else if rule.is_broadcast(table) {
                mappers.push(RouteMapper::identity(table));
            }
        }

        if sharded {
            context.push_unit(RouteUnit::new(RouteMapper::identity(data_source), mappers));
        }
    }

    context
}

/// One data source: the default one, else the first configured.
pub(crate) fn unicast(statement: &StatementContext, rule: &ShardingRule) -> RouteContext {
    let data_source = rule
        .default_data_source()
        .or_else(|| rule.data_sources().first().map(String::as_str))
        .unwrap_or_default();

    single_unit(RouteStrategyKind::Unicast, statement, data_source)
}

/// Unsharded tables live on the default data source.
pub(crate) fn pass_through(
    statement: &StatementContext,
    rule: &ShardingRule,
) -> Result<RouteContext, InternalError> {
    let logic_table = statement.tables.first().map_or("", String::as_str);
    let data_source = rule.resolve_default_data_source(logic_table)?;

    Ok(single_unit(
        RouteStrategyKind::PassThrough,
        statement,
        data_source,
    ))
}

/// The whole statement on one named data source.
pub(crate) fn data_source_hint(
    statement: &StatementContext,
    rule: &ShardingRule,
    data_source: &str,
) -> Result<RouteContext, InternalError> {
    if !rule.data_sources().iter().any(|name| name == data_source) {
        return Err(InternalError::rule_config(ConfigError::UnknownDataSource {
            logic_table: statement.tables.first().cloned().unwrap_or_default(),
            data_source: data_source.to_string(),
        }));
    }

    Ok(single_unit(
        RouteStrategyKind::DataSourceHint,
        statement,
        data_source,
    ))
}
