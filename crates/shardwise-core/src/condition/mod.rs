//! Sharding condition extraction.
//!
//! Turns a bound statement into the column/value pairs that can narrow
//! routing: one condition per insert row, or one per WHERE AND-group.

#[cfg(test)]
mod tests;

use crate::{
    error::InternalError,
    rule::ShardingRule,
    statement::{ColumnRef, CompareOp, Expr, InsertValues, Operand, StatementContext, StatementKind},
    value::{Value, ValueRange, canonical_eq},
};
use derive_more::{Deref, IntoIterator};
use std::ops::Bound;

///
/// ConditionValues
///

#[derive(Clone, Debug, PartialEq)]
pub enum ConditionValues {
    /// Equality / IN candidates, fully resolved.
    List(Vec<Value>),

    /// BETWEEN or inequality interval.
    Range(ValueRange),
}

impl ConditionValues {
    // Values of one column inside one AND-group are conjunctive.
    fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::List(left), Self::List(right)) => Self::List(
                left.iter()
                    .filter(|value| right.iter().any(|candidate| canonical_eq(value, candidate)))
                    .cloned()
                    .collect(),
            ),
            (Self::List(list), Self::Range(range)) | (Self::Range(range), Self::List(list)) => {
                Self::List(
                    list.iter()
                        .filter(|value| range.contains(value))
                        .cloned()
                        .collect(),
                )
            }
            (Self::Range(left), Self::Range(right)) => Self::Range(left.intersect(right)),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::List(values) => values.is_empty(),
            Self::Range(range) => range.is_empty(),
        }
    }
}

///
/// ShardingConditionValue
///
/// Values for one sharding column of one logical table. Table and column
/// names are lower-case.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ShardingConditionValue {
    pub table: String,
    pub column: String,
    pub values: ConditionValues,
}

///
/// ShardingCondition
///
/// Conditions of one insert row or one AND-group. An always-false group
/// (contradictory predicates on one column) matches no shard.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShardingCondition {
    pub values: Vec<ShardingConditionValue>,
    pub always_false: bool,
}

impl ShardingCondition {
    /// Values of this condition that belong to `logic_table`.
    #[must_use]
    pub fn values_for(&self, logic_table: &str) -> Vec<ShardingConditionValue> {
        let key = logic_table.to_ascii_lowercase();
        self.values
            .iter()
            .filter(|value| value.table == key)
            .cloned()
            .collect()
    }

    fn push(&mut self, table: &str, column: &str, values: ConditionValues) {
        if let Some(existing) = self
            .values
            .iter_mut()
            .find(|existing| existing.table == table && existing.column == column)
        {
            existing.values = existing.values.intersect(&values);
            if existing.values.is_empty() {
                self.always_false = true;
            }
            return;
        }

        if values.is_empty() {
            self.always_false = true;
        }
        self.values.push(ShardingConditionValue {
            table: table.to_string(),
            column: column.to_string(),
            values,
        });
    }
}

///
/// ShardingConditions
///
/// Index-aligned with statement rows (INSERT) or AND-groups (others).
/// Empty means unconditioned: route by default or broadcast strategy.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
pub struct ShardingConditions(#[into_iterator(owned, ref)] Vec<ShardingCondition>);

impl ShardingConditions {
    #[must_use]
    pub const fn new(conditions: Vec<ShardingCondition>) -> Self {
        Self(conditions)
    }

    #[must_use]
    pub const fn unconditioned() -> Self {
        Self(Vec::new())
    }

    /// Whether every group contradicts itself.
    #[must_use]
    pub fn is_always_false(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|condition| condition.always_false)
    }
}

/// Extract sharding conditions from a bound statement.
///
/// Pure. Parameter markers are substituted before values leave this
/// function; a marker without a bound parameter is an invariant violation.
pub fn extract(
    statement: &StatementContext,
    params: &[Value],
    rule: &ShardingRule,
) -> Result<ShardingConditions, InternalError> {
    if statement.hint.is_some() {
        return Ok(ShardingConditions::unconditioned());
    }

    match statement.kind {
        StatementKind::Insert => match &statement.insert {
            Some(insert) => extract_insert(statement, insert, params, rule),
            None => Ok(ShardingConditions::unconditioned()),
        },
        StatementKind::Select | StatementKind::Update | StatementKind::Delete => {
            extract_where(statement, params, rule)
        }
        StatementKind::Ddl | StatementKind::Tcl => Ok(ShardingConditions::unconditioned()),
    }
}

fn extract_insert(
    statement: &StatementContext,
    insert: &InsertValues,
    params: &[Value],
    rule: &ShardingRule,
) -> Result<ShardingConditions, InternalError> {
    let Some(table) = statement.tables.first() else {
        return Ok(ShardingConditions::unconditioned());
    };
    let Some(table_rule) = rule.table_rule(table) else {
        return Ok(ShardingConditions::unconditioned());
    };
    let table_key = table.to_ascii_lowercase();

    let columns = insert
        .columns
        .iter()
        .map(|column| column.to_ascii_lowercase())
        .collect::<Vec<_>>();
    let generated = insert.generated_keys.as_ref().and_then(|keys| {
        let column = keys.column.to_ascii_lowercase();
        (!columns.contains(&column)).then_some((column, &keys.values))
    });

    let mut conditions = Vec::with_capacity(insert.rows.len());
    let mut any_values = false;

    for (row_index, row) in insert.rows.iter().enumerate() {
        let mut condition = ShardingCondition::default();

        for sharding_column in table_rule.sharding_columns() {
            let value = if let Some(position) = columns.iter().position(|c| c == sharding_column)
            {
                match row.get(position) {
                    Some(operand) => Some(operand.resolve(params)?),
                    None => None,
                }
            } else {
                generated
                    .as_ref()
                    .filter(|(column, _)| column == sharding_column)
                    .and_then(|(_, values)| values.get(row_index).cloned())
            };

            if let Some(value) = value {
                condition.push(&table_key, sharding_column, ConditionValues::List(vec![value]));
            }
        }

        any_values |= !condition.values.is_empty();
        conditions.push(condition);
    }

    if !any_values {
        return Ok(ShardingConditions::unconditioned());
    }

    Ok(ShardingConditions::new(conditions))
}

fn extract_where(
    statement: &StatementContext,
    params: &[Value],
    rule: &ShardingRule,
) -> Result<ShardingConditions, InternalError> {
    let mut predicates = Vec::new();
    predicates.extend(statement.where_clause.clone());
    predicates.extend(statement.subquery_predicates.iter().cloned());
    if predicates.is_empty() {
        return Ok(ShardingConditions::unconditioned());
    }

    let root = Expr::and(predicates);
    let Some(groups) = root.and_groups() else {
        return Ok(ShardingConditions::unconditioned());
    };

    let mut conditions = Vec::with_capacity(groups.len());
    for group in groups {
        let mut condition = ShardingCondition::default();
        for atom in group {
            collect_atom(statement, atom, params, rule, &mut condition)?;
        }

        // One unnarrowed group means the statement as a whole cannot be
        // narrowed: the union of its groups reaches every shard anyway.
        if condition.values.is_empty() && !condition.always_false {
            return Ok(ShardingConditions::unconditioned());
        }
        conditions.push(condition);
    }

    Ok(ShardingConditions::new(conditions))
}

fn collect_atom(
    statement: &StatementContext,
    atom: &Expr,
    params: &[Value],
    rule: &ShardingRule,
    condition: &mut ShardingCondition,
) -> Result<(), InternalError> {
    let (column, values) = match atom {
        Expr::Compare {
            column,
            op,
            operand,
        } => {
            let value = operand.resolve(params)?;
            let values = match op {
                CompareOp::Eq => ConditionValues::List(vec![value]),
                CompareOp::Lt => ConditionValues::Range(ValueRange::less_than(value)),
                CompareOp::Le => ConditionValues::Range(ValueRange::at_most(value)),
                CompareOp::Gt => ConditionValues::Range(ValueRange::greater_than(value)),
                CompareOp::Ge => ConditionValues::Range(ValueRange::at_least(value)),
                CompareOp::Ne => return Ok(()),
            };
            (column, values)
        }
        Expr::In { column, operands } => {
            let values = operands
                .iter()
                .map(|operand| operand.resolve(params))
                .collect::<Result<Vec<_>, _>>()?;
            (column, ConditionValues::List(values))
        }
        Expr::Between { column, low, high } => {
            let range = ValueRange::new(
                Bound::Included(low.resolve(params)?),
                Bound::Included(high.resolve(params)?),
            );
            (column, ConditionValues::Range(range))
        }
        Expr::And(_) | Expr::Or(_) | Expr::Opaque => return Ok(()),
    };

    let column_key = column.column.to_ascii_lowercase();
    for table in owning_tables(statement, column, rule) {
        condition.push(&table, &column_key, values.clone());
    }

    Ok(())
}

// Tables for which `column` is a sharding column: the qualifier when present,
// otherwise every statement table that shards on a column of that name.
fn owning_tables(statement: &StatementContext, column: &ColumnRef, rule: &ShardingRule) -> Vec<String> {
    match &column.table {
        Some(table) if rule.is_sharding_column(table, &column.column) => {
            vec![table.to_ascii_lowercase()]
        }
        Some(_) => Vec::new(),
        None => statement
            .tables
            .iter()
            .filter(|table| rule.is_sharding_column(table, &column.column))
            .map(|table| table.to_ascii_lowercase())
            .collect(),
    }
}

/// Parameter indexes that feed routing for `statement`, sorted and unique.
pub(crate) fn routing_parameter_indexes(statement: &StatementContext, rule: &ShardingRule) -> Vec<usize> {
    let is_routing_column = |column: &ColumnRef| !owning_tables(statement, column, rule).is_empty();

    let mut indexes = Vec::new();
    if let Some(expr) = &statement.where_clause {
        expr.routing_params(&is_routing_column, &mut indexes);
    }
    for expr in &statement.subquery_predicates {
        expr.routing_params(&is_routing_column, &mut indexes);
    }
    if let (Some(insert), Some(table)) = (&statement.insert, statement.tables.first()) {
        for (position, column) in insert.columns.iter().enumerate() {
            if rule.is_sharding_column(table, column) {
                indexes.extend(
                    insert
                        .rows
                        .iter()
                        .filter_map(|row| row.get(position).and_then(Operand::param_index)),
                );
            }
        }
    }

    indexes.sort_unstable();
    indexes.dedup();
    indexes
}
