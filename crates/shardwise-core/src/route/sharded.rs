//! Routing for statements over sharded tables: standard (one table or one
//! binding group), cartesian (several unrelated groups) and sharding hints.

use crate::{
    condition::{ShardingCondition, ShardingConditionValue, ShardingConditions},
    error::InternalError,
    route::{RouteContext, RouteMapper, RouteStrategyKind, RouteUnit},
    rule::{DataNode, ShardingInput, ShardingRule, TableRule},
    value::Value,
};

///
/// RouteInput
///
/// Where sharding values come from for one routing pass.
///

#[derive(Clone, Copy, Debug)]
pub(crate) enum RouteInput<'a> {
    Conditions(&'a ShardingConditions),
    Hint {
        database_values: &'a [Value],
        table_values: &'a [Value],
    },
}

///
/// TableGroup
///
/// A primary sharded table and the binding tables that follow its shard
/// index.
///

struct TableGroup<'a> {
    primary: &'a TableRule,
    bound: Vec<&'a TableRule>,
}

///
/// GroupRoute
///

struct GroupRoute {
    units: Vec<RouteUnit>,
    original_data_nodes: Vec<Vec<DataNode>>,
}

/// Partition sharded tables into binding groups, in statement order.
fn group_tables<'a>(tables: &[&'a TableRule], rule: &ShardingRule) -> Vec<TableGroup<'a>> {
    let mut groups: Vec<TableGroup<'a>> = Vec::new();

    for &table in tables {
        let joined = groups.iter_mut().find(|group| {
            rule.are_all_binding(&[group.primary.logic_table(), table.logic_table()])
        });
        match joined {
            Some(group) => group.bound.push(table),
            None => groups.push(TableGroup {
                primary: table,
                bound: Vec::new(),
            }),
        }
    }

    groups
}

/// Route sharded tables as one unit set.
///
/// One binding group yields its units directly; several groups are combined
/// per data source by cartesian product of their table mappers.
pub(crate) fn route_sharded(
    kind: RouteStrategyKind,
    tables: &[&TableRule],
    input: RouteInput<'_>,
    rule: &ShardingRule,
    allow_range: bool,
) -> Result<RouteContext, InternalError> {
    let groups = group_tables(tables, rule);
    let mut context = RouteContext::new(kind);

    match groups.as_slice() {
        [] => {}
        [group] => {
            let routed = route_group(group, input, rule, allow_range)?;
            for unit in routed.units {
                context.push_unit(unit);
            }
            for nodes in routed.original_data_nodes {
                context.push_original_nodes(nodes);
            }
        }
        _ => {
            let routed = groups
                .iter()
                .map(|group| route_group(group, input, rule, allow_range))
                .collect::<Result<Vec<_>, _>>()?;
            for unit in cartesian_units(&routed) {
                context.push_unit(unit);
            }
        }
    }

    Ok(context)
}

fn route_group(
    group: &TableGroup<'_>,
    input: RouteInput<'_>,
    rule: &ShardingRule,
    allow_range: bool,
) -> Result<GroupRoute, InternalError> {
    let mut routed = GroupRoute {
        units: Vec::new(),
        original_data_nodes: Vec::new(),
    };

    match input {
        RouteInput::Conditions(conditions) if conditions.is_empty() => {
            let nodes = route_nodes(
                group.primary,
                ShardingInput::Unconditioned,
                ShardingInput::Unconditioned,
                allow_range,
            )?;
            push_units(&mut routed, group, &nodes, rule)?;
        }
        RouteInput::Conditions(conditions) => {
            for condition in conditions.iter() {
                if condition.always_false {
                    routed.original_data_nodes.push(Vec::new());
                    continue;
                }

                let values = group_values(condition, group);
                let nodes = route_nodes(
                    group.primary,
                    ShardingInput::Conditions(&values),
                    ShardingInput::Conditions(&values),
                    allow_range,
                )?;
                push_units(&mut routed, group, &nodes, rule)?;
                routed.original_data_nodes.push(nodes);
            }
        }
        RouteInput::Hint {
            database_values,
            table_values,
        } => {
            let nodes = route_nodes(
                group.primary,
                hint_input(database_values),
                hint_input(table_values),
                allow_range,
            )?;
            push_units(&mut routed, group, &nodes, rule)?;
        }
    }

    Ok(routed)
}

const fn hint_input(values: &[Value]) -> ShardingInput<'_> {
    if values.is_empty() {
        ShardingInput::Unconditioned
    } else {
        ShardingInput::Hint(values)
    }
}

// Values of the primary table, completed by binding-table values on columns
// the primary has no value for. Binding tables share the shard shape, so a
// bound table's key narrows the primary the same way.
fn group_values(condition: &ShardingCondition, group: &TableGroup<'_>) -> Vec<ShardingConditionValue> {
    let mut values = condition.values_for(group.primary.logic_table());

    for bound in &group.bound {
        for mut value in condition.values_for(bound.logic_table()) {
            if values.iter().any(|existing| existing.column == value.column) {
                continue;
            }
            value.table = group.primary.logic_table().to_ascii_lowercase();
            values.push(value);
        }
    }

    values
}

/// Evaluate both sharding dimensions of one table.
fn route_nodes(
    table: &TableRule,
    database_input: ShardingInput<'_>,
    table_input: ShardingInput<'_>,
    allow_range: bool,
) -> Result<Vec<DataNode>, InternalError> {
    let logic_table = table.logic_table();
    let data_sources = table.database_strategy().shard(
        logic_table,
        table.data_sources(),
        database_input,
        allow_range,
    )?;

    let mut nodes = Vec::new();
    for data_source in data_sources {
        let actual_tables = table.table_strategy().shard(
            logic_table,
            table.actual_tables(&data_source),
            table_input,
            allow_range,
        )?;
        nodes.extend(
            actual_tables
                .into_iter()
                .map(|actual| DataNode::new(data_source.as_str(), actual)),
        );
    }

    Ok(nodes)
}

fn push_units(
    routed: &mut GroupRoute,
    group: &TableGroup<'_>,
    nodes: &[DataNode],
    rule: &ShardingRule,
) -> Result<(), InternalError> {
    for node in nodes {
        let mut mappers = Vec::with_capacity(1 + group.bound.len());
        mappers.push(RouteMapper::new(group.primary.logic_table(), node.table.as_str()));
        for bound in &group.bound {
            let actual = rule.binding_actual_table(
                group.primary,
                &node.data_source,
                &node.table,
                bound.logic_table(),
            )?;
            mappers.push(RouteMapper::new(bound.logic_table(), actual));
        }

        let unit = RouteUnit::new(RouteMapper::identity(&node.data_source), mappers);
        if !routed.units.contains(&unit) {
            routed.units.push(unit);
        }
    }

    Ok(())
}

// Data sources reached by every group, in the first group's order; on each,
// one unit per combination of the groups' table mappers.
fn cartesian_units(groups: &[GroupRoute]) -> Vec<RouteUnit> {
    let Some((first, rest)) = groups.split_first() else {
        return Vec::new();
    };

    let mut data_sources: Vec<&str> = Vec::new();
    for unit in &first.units {
        let data_source = unit.data_source();
        if !data_sources.contains(&data_source)
            && rest
                .iter()
                .all(|group| group.units.iter().any(|u| u.data_source() == data_source))
        {
            data_sources.push(data_source);
        }
    }

    let mut units = Vec::new();
    for data_source in data_sources {
        let mut combinations: Vec<Vec<RouteMapper>> = vec![Vec::new()];
        for group in groups {
            let on_source = group
                .units
                .iter()
                .filter(|unit| unit.data_source() == data_source)
                .collect::<Vec<_>>();
            combinations = combinations
                .iter()
                .flat_map(|prefix| {
                    on_source.iter().map(move |unit| {
                        let mut mappers = prefix.clone();
                        mappers.extend(unit.table_mappers.iter().cloned());
                        mappers
                    })
                })
                .collect();
        }

        units.extend(
            combinations
                .into_iter()
                .map(|mappers| RouteUnit::new(RouteMapper::identity(data_source), mappers)),
        );
    }

    units
}
