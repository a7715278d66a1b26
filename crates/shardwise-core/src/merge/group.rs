//! GROUP BY and aggregate merges.

use crate::{
    error::InternalError,
    merge::{
        MergeKind,
        aggregate::{AggregateColumn, GroupAccumulator, empty_aggregate_row},
        compare::{compare_keys, row_key},
        memory::{KeyIndex, MemoryMergedResult, labels_of, load_rows, sort_rows},
        result::{MergedResult, QueryResult},
        stream::OrderByStreamMergedResult,
    },
    obs::MetricsSink,
    statement::OrderByItem,
    value::Value,
};
use std::{cmp::Ordering, sync::Arc};

///
/// GroupByStreamMergedResult
///
/// Combines consecutive rows of a group-key ordered k-way merge. Shards
/// must return rows sorted by the GROUP BY items; one group is held at a
/// time.
///

pub struct GroupByStreamMergedResult<'a> {
    inner: OrderByStreamMergedResult<'a>,
    group_by: Vec<OrderByItem>,
    columns: Vec<AggregateColumn>,
    width: usize,
    pending: Option<Vec<Value>>,
    current: Option<Vec<Value>>,
    emitted: bool,
}

impl<'a> GroupByStreamMergedResult<'a> {
    pub(crate) fn new(
        results: Vec<Box<dyn QueryResult + 'a>>,
        group_by: &[OrderByItem],
        columns: Vec<AggregateColumn>,
        width: usize,
        validation: Option<Arc<dyn MetricsSink>>,
    ) -> Result<Self, InternalError> {
        Ok(Self {
            inner: OrderByStreamMergedResult::new(results, group_by, validation)?,
            group_by: group_by.to_vec(),
            columns,
            width,
            pending: None,
            current: None,
            emitted: false,
        })
    }

    fn pull(&mut self) -> Result<Option<Vec<Value>>, InternalError> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        if self.inner.next()? {
            return self.inner.row().map(Some);
        }

        Ok(None)
    }
}

impl MergedResult for GroupByStreamMergedResult<'_> {
    fn next(&mut self) -> Result<bool, InternalError> {
        let Some(first) = self.pull()? else {
            self.current = None;
            // Aggregates without GROUP BY still produce one row.
            if !self.emitted && self.group_by.is_empty() && !self.columns.is_empty() {
                self.emitted = true;
                self.current = Some(empty_aggregate_row(self.width, &self.columns));
                return Ok(true);
            }
            return Ok(false);
        };

        let key = row_key(&first, &self.group_by)?;
        let mut group = GroupAccumulator::new(first, &self.columns)?;
        while let Some(row) = self.pull()? {
            if compare_keys(&key, &row_key(&row, &self.group_by)?, &self.group_by)
                == Ordering::Equal
            {
                group.accumulate(&row, &self.columns)?;
            } else {
                self.pending = Some(row);
                break;
            }
        }

        self.emitted = true;
        self.current = Some(group.finish(&self.columns)?);

        Ok(true)
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| InternalError::merge_invariant("merged result has no current row"))?;

        row.get(column_index)
            .ok_or_else(|| InternalError::column_not_found(column_index, row.len()))
    }

    fn column_count(&self) -> usize {
        self.width
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.inner.column_label(column_index)
    }

    fn kind(&self) -> MergeKind {
        MergeKind::GroupByStream
    }

    fn inner(&self) -> Option<&dyn MergedResult> {
        Some(&self.inner)
    }
}

/// Fold every shard row into per-key groups, then order the groups by
/// `order_by` (or the group key when there is none).
pub(crate) fn group_by_memory(
    mut results: Vec<Box<dyn QueryResult + '_>>,
    group_by: &[OrderByItem],
    order_by: &[OrderByItem],
    columns: &[AggregateColumn],
    labels: Vec<String>,
) -> Result<MemoryMergedResult, InternalError> {
    let width = labels.len();
    let labels = if results.is_empty() {
        labels
    } else {
        labels_of(&results)
    };

    let mut index = KeyIndex::new(group_by.iter().map(|item| item.collation).collect());
    let mut groups: Vec<GroupAccumulator> = Vec::new();
    for row in load_rows(&mut results)? {
        let (position, inserted) = index.find_or_insert(&row_key(&row, group_by)?);
        if inserted {
            groups.push(GroupAccumulator::new(row, columns)?);
        } else {
            groups[position].accumulate(&row, columns)?;
        }
    }
    debug_assert_eq!(index.len(), groups.len());

    let mut rows = groups
        .into_iter()
        .map(|group| group.finish(columns))
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() && group_by.is_empty() && !columns.is_empty() {
        rows.push(empty_aggregate_row(labels.len().max(width), columns));
    }

    let sort_items = if order_by.is_empty() { group_by } else { order_by };
    let rows = sort_rows(rows, sort_items)?;

    Ok(MemoryMergedResult::new(MergeKind::GroupByMemory, labels, rows))
}
