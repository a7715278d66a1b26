//! Per-group aggregate accumulation over shard partial results.

use crate::{
    error::InternalError,
    merge::memory::KeyIndex,
    statement::{AggregateKind, AvgColumns, StatementContext},
    value::{Value, canonical_cmp, checked_divide, widening_add},
};
use std::cmp::Ordering;

///
/// AggregateColumn
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct AggregateColumn {
    index: usize,
    kind: AggregateKind,
    distinct: bool,
    avg_columns: Option<AvgColumns>,
}

impl AggregateColumn {
    pub(crate) const fn is_distinct(&self) -> bool {
        self.distinct
    }
}

/// Aggregate columns of the statement's projection.
///
/// A non-distinct `AVG` must come with its derived SUM/COUNT columns:
/// shard-local averages cannot be combined.
pub(crate) fn aggregate_columns(
    statement: &StatementContext,
) -> Result<Vec<AggregateColumn>, InternalError> {
    statement
        .aggregates()
        .map(|(index, aggregate)| {
            if aggregate.kind == AggregateKind::Avg
                && !aggregate.distinct
                && aggregate.avg_columns.is_none()
            {
                return Err(InternalError::merge_unsupported(format!(
                    "AVG at column {index} has no derived SUM and COUNT columns"
                )));
            }

            Ok(AggregateColumn {
                index,
                kind: aggregate.kind,
                distinct: aggregate.distinct,
                avg_columns: aggregate.avg_columns,
            })
        })
        .collect()
}

/// The single row an aggregate-only query yields over no rows at all:
/// `COUNT` is zero, everything else null.
pub(crate) fn empty_aggregate_row(width: usize, columns: &[AggregateColumn]) -> Vec<Value> {
    let mut row = vec![Value::Null; width];
    for column in columns {
        if column.kind == AggregateKind::Count
            && let Some(cell) = row.get_mut(column.index)
        {
            *cell = Value::Int(0);
        }
    }

    row
}

fn cell(row: &[Value], index: usize) -> Result<&Value, InternalError> {
    row.get(index)
        .ok_or_else(|| InternalError::column_not_found(index, row.len()))
}

///
/// AggregateState
///

enum AggregateState {
    Total(Value),
    Extreme(Option<Value>),
    Average { sum: Value, count: Value },
    Distinct { index: KeyIndex, values: Vec<Value> },
}

impl AggregateState {
    fn new(column: &AggregateColumn) -> Self {
        if column.distinct {
            return Self::Distinct {
                index: KeyIndex::default(),
                values: Vec::new(),
            };
        }

        match column.kind {
            AggregateKind::Count | AggregateKind::Sum => Self::Total(Value::Null),
            AggregateKind::Min | AggregateKind::Max => Self::Extreme(None),
            AggregateKind::Avg => Self::Average {
                sum: Value::Null,
                count: Value::Null,
            },
        }
    }

    fn accumulate(&mut self, column: &AggregateColumn, row: &[Value]) -> Result<(), InternalError> {
        match self {
            Self::Total(total) => *total = widening_add(total, cell(row, column.index)?)?,
            Self::Extreme(current) => {
                let value = cell(row, column.index)?;
                if !value.is_null() {
                    let replace = current
                        .as_ref()
                        .is_none_or(|current| prefer(column.kind, value, current));
                    if replace {
                        *current = Some(value.clone());
                    }
                }
            }
            Self::Average { sum, count } => {
                let columns = column.avg_columns.ok_or_else(|| {
                    InternalError::merge_invariant("AVG state without derived columns")
                })?;
                *sum = widening_add(sum, cell(row, columns.sum_index)?)?;
                *count = widening_add(count, cell(row, columns.count_index)?)?;
            }
            Self::Distinct { index, values } => {
                let value = cell(row, column.index)?;
                if !value.is_null() && index.find_or_insert(std::slice::from_ref(value)).1 {
                    values.push(value.clone());
                }
            }
        }

        Ok(())
    }

    fn finish(self, column: &AggregateColumn, row: &mut [Value]) -> Result<(), InternalError> {
        let value = match self {
            Self::Total(total) => match (column.kind, total) {
                (AggregateKind::Count, Value::Null) => Value::Int(0),
                (_, total) => total,
            },
            Self::Extreme(value) => value.unwrap_or(Value::Null),
            Self::Average { sum, count } => {
                if let Some(columns) = column.avg_columns {
                    write(row, columns.sum_index, sum.clone())?;
                    write(row, columns.count_index, count.clone())?;
                }
                checked_divide(&sum, &count)?
            }
            Self::Distinct { values, .. } => finish_distinct(column.kind, values)?,
        };

        write(row, column.index, value)
    }
}

fn prefer(kind: AggregateKind, candidate: &Value, current: &Value) -> bool {
    let ordering = canonical_cmp(candidate, current);
    match kind {
        AggregateKind::Min => ordering == Ordering::Less,
        _ => ordering == Ordering::Greater,
    }
}

fn write(row: &mut [Value], index: usize, value: Value) -> Result<(), InternalError> {
    let width = row.len();
    let slot = row
        .get_mut(index)
        .ok_or_else(|| InternalError::column_not_found(index, width))?;
    *slot = value;

    Ok(())
}

fn finish_distinct(kind: AggregateKind, values: Vec<Value>) -> Result<Value, InternalError> {
    let count = Value::Int(i64::try_from(values.len()).unwrap_or(i64::MAX));

    match kind {
        AggregateKind::Count => Ok(count),
        AggregateKind::Sum | AggregateKind::Avg => {
            let mut sum = Value::Null;
            for value in &values {
                sum = widening_add(&sum, value)?;
            }
            if kind == AggregateKind::Sum {
                Ok(sum)
            } else {
                checked_divide(&sum, &count)
            }
        }
        AggregateKind::Min | AggregateKind::Max => Ok(values
            .into_iter()
            .reduce(|current, value| {
                if prefer(kind, &value, &current) {
                    value
                } else {
                    current
                }
            })
            .unwrap_or(Value::Null)),
    }
}

///
/// GroupAccumulator
///
/// One output group. Non-aggregate columns keep the group's first row.
///

pub(crate) struct GroupAccumulator {
    row: Vec<Value>,
    states: Vec<AggregateState>,
}

impl GroupAccumulator {
    pub(crate) fn new(row: Vec<Value>, columns: &[AggregateColumn]) -> Result<Self, InternalError> {
        let mut group = Self {
            states: columns.iter().map(AggregateState::new).collect(),
            row: Vec::new(),
        };
        group.accumulate(&row, columns)?;
        group.row = row;

        Ok(group)
    }

    pub(crate) fn accumulate(
        &mut self,
        row: &[Value],
        columns: &[AggregateColumn],
    ) -> Result<(), InternalError> {
        for (state, column) in self.states.iter_mut().zip(columns) {
            state.accumulate(column, row)?;
        }

        Ok(())
    }

    pub(crate) fn finish(self, columns: &[AggregateColumn]) -> Result<Vec<Value>, InternalError> {
        let mut row = self.row;
        for (state, column) in self.states.into_iter().zip(columns) {
            state.finish(column, &mut row)?;
        }

        Ok(row)
    }
}
