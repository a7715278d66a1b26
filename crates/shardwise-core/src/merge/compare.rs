use crate::{
    error::InternalError,
    merge::result::QueryResult,
    statement::{Direction, OrderByItem},
    value::{Value, collated_cmp},
};
use std::{cmp::Ordering, sync::Arc};

/// Compare two key tuples item by item.
///
/// Values compare by semantic type across numeric widths; nulls sort first
/// ascending and last descending.
pub(crate) fn compare_keys(left: &[Value], right: &[Value], items: &[OrderByItem]) -> Ordering {
    for ((left, right), item) in left.iter().zip(right).zip(items) {
        let ordering = collated_cmp(left, right, item.collation);
        let ordering = match item.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Key tuple of a full row.
pub(crate) fn row_key(row: &[Value], items: &[OrderByItem]) -> Result<Vec<Value>, InternalError> {
    items
        .iter()
        .map(|item| {
            row.get(item.column_index)
                .cloned()
                .ok_or_else(|| InternalError::column_not_found(item.column_index, row.len()))
        })
        .collect()
}

/// Key tuple of a shard cursor's current row.
pub(crate) fn cursor_key(
    result: &dyn QueryResult,
    items: &[OrderByItem],
) -> Result<Vec<Value>, InternalError> {
    items
        .iter()
        .map(|item| result.value(item.column_index).cloned())
        .collect()
}

///
/// OrderByValue
///
/// Current ORDER BY key of one shard cursor. Ordered so that a max-heap pops
/// the row that sorts first; equal keys pop in shard order.
///

#[derive(Clone, Debug)]
pub(crate) struct OrderByValue {
    pub(crate) shard: usize,
    pub(crate) keys: Vec<Value>,
    items: Arc<[OrderByItem]>,
}

impl OrderByValue {
    pub(crate) const fn new(shard: usize, keys: Vec<Value>, items: Arc<[OrderByItem]>) -> Self {
        Self { shard, keys, items }
    }
}

impl Ord for OrderByValue {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&self.keys, &other.keys, &self.items)
            .then(self.shard.cmp(&other.shard))
            .reverse()
    }
}

impl PartialOrd for OrderByValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderByValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderByValue {}
