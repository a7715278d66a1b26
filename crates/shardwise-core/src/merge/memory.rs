//! Materializing cores: every shard row is loaded before the first `next()`.

use crate::{
    error::InternalError,
    merge::{
        MergeKind,
        compare::{compare_keys, row_key},
        result::{MergedResult, QueryResult, current_row},
    },
    statement::OrderByItem,
    value::{Collation, Value, ValueHash, ValueHasher, collated_cmp},
};
use std::{cmp::Ordering, collections::HashMap};

/// Column labels of the first shard cursor.
pub(crate) fn labels_of(results: &[Box<dyn QueryResult + '_>]) -> Vec<String> {
    results.first().map_or_else(Vec::new, |result| {
        (0..result.column_count())
            .map(|index| result.column_label(index).unwrap_or_default().to_string())
            .collect()
    })
}

/// Drain every shard cursor, in route unit order.
pub(crate) fn load_rows(
    results: &mut [Box<dyn QueryResult + '_>],
) -> Result<Vec<Vec<Value>>, InternalError> {
    let mut rows = Vec::new();
    for result in results {
        while result.next()? {
            rows.push(current_row(&**result)?);
        }
    }

    Ok(rows)
}

/// Stable sort by the given items.
pub(crate) fn sort_rows(
    rows: Vec<Vec<Value>>,
    items: &[OrderByItem],
) -> Result<Vec<Vec<Value>>, InternalError> {
    if items.is_empty() {
        return Ok(rows);
    }

    let mut keyed = rows
        .into_iter()
        .map(|row| row_key(&row, items).map(|key| (key, row)))
        .collect::<Result<Vec<_>, _>>()?;
    keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right, items));

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

///
/// KeyIndex
///
/// Insertion-ordered set of value tuples. Tuples are bucketed by canonical
/// hash and confirmed with the collated comparator, so `Int(3)` and
/// `Int128(3)` are one key.
///

#[derive(Debug, Default)]
pub(crate) struct KeyIndex {
    collations: Vec<Collation>,
    keys: Vec<Vec<Value>>,
    buckets: HashMap<ValueHash, Vec<usize>>,
}

impl KeyIndex {
    /// Index comparing column `i` under `collations[i]`; missing entries
    /// compare as binary.
    pub(crate) fn new(collations: Vec<Collation>) -> Self {
        Self {
            collations,
            keys: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    fn collation(&self, column: usize) -> Collation {
        self.collations.get(column).copied().unwrap_or_default()
    }

    /// Position of `key`, inserting it when unseen. The flag is `true` for a
    /// new key.
    pub(crate) fn find_or_insert(&mut self, key: &[Value]) -> (usize, bool) {
        let mut hasher = ValueHasher::new();
        for (column, value) in key.iter().enumerate() {
            hasher.push(value, self.collation(column));
        }
        let hash = hasher.finish();

        if let Some(positions) = self.buckets.get(&hash) {
            for &position in positions {
                let equal = self.keys[position].len() == key.len()
                    && self.keys[position]
                        .iter()
                        .zip(key)
                        .enumerate()
                        .all(|(column, (left, right))| {
                            collated_cmp(left, right, self.collation(column)) == Ordering::Equal
                        });
                if equal {
                    return (position, false);
                }
            }
        }

        let position = self.keys.len();
        self.keys.push(key.to_vec());
        self.buckets.entry(hash).or_default().push(position);

        (position, true)
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
}

///
/// MemoryMergedResult
///
/// Cursor over fully materialized merged rows.
///

pub struct MemoryMergedResult {
    kind: MergeKind,
    labels: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl MemoryMergedResult {
    pub(crate) const fn new(kind: MergeKind, labels: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            kind,
            labels,
            rows,
            position: None,
        }
    }

    /// Load every shard row and sort once; for ORDER BY that shards could
    /// not pre-sort.
    pub fn order_by(
        mut results: Vec<Box<dyn QueryResult + '_>>,
        items: &[OrderByItem],
    ) -> Result<Self, InternalError> {
        let labels = labels_of(&results);
        let rows = sort_rows(load_rows(&mut results)?, items)?;

        Ok(Self::new(MergeKind::OrderByMemory, labels, rows))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MergedResult for MemoryMergedResult {
    fn next(&mut self) -> Result<bool, InternalError> {
        let next = self.position.map_or(0, |position| position + 1);
        self.position = Some(next.min(self.rows.len()));

        Ok(next < self.rows.len())
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        let row = self
            .position
            .and_then(|position| self.rows.get(position))
            .ok_or_else(|| InternalError::merge_invariant("merged result has no current row"))?;

        row.get(column_index)
            .ok_or_else(|| InternalError::column_not_found(column_index, row.len()))
    }

    fn column_count(&self) -> usize {
        if self.labels.is_empty() {
            self.rows.first().map_or(0, Vec::len)
        } else {
            self.labels.len()
        }
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.labels.get(column_index).map(String::as_str)
    }

    fn kind(&self) -> MergeKind {
        self.kind
    }
}
