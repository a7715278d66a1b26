//! Streaming cores: sequential iteration and k-way ORDER BY merge.

use crate::{
    error::InternalError,
    merge::{
        MergeKind,
        compare::{OrderByValue, compare_keys, cursor_key},
        result::{MergedResult, QueryResult},
    },
    obs::{MetricsEvent, MetricsSink},
    statement::OrderByItem,
    value::Value,
};
use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};
use tracing::warn;

fn no_current_row() -> InternalError {
    InternalError::merge_invariant("merged result has no current row")
}

///
/// IteratorMergedResult
///
/// Exhausts one shard cursor after another, in route unit order.
///

pub struct IteratorMergedResult<'a> {
    results: Vec<Box<dyn QueryResult + 'a>>,
    index: usize,
}

impl<'a> IteratorMergedResult<'a> {
    #[must_use]
    pub fn new(results: Vec<Box<dyn QueryResult + 'a>>) -> Self {
        Self { results, index: 0 }
    }
}

impl MergedResult for IteratorMergedResult<'_> {
    fn next(&mut self) -> Result<bool, InternalError> {
        while let Some(result) = self.results.get_mut(self.index) {
            if result.next()? {
                return Ok(true);
            }
            self.index += 1;
        }

        Ok(false)
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        self.results
            .get(self.index)
            .ok_or_else(no_current_row)?
            .value(column_index)
    }

    fn column_count(&self) -> usize {
        self.results.first().map_or(0, |result| result.column_count())
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.results.first()?.column_label(column_index)
    }

    fn kind(&self) -> MergeKind {
        MergeKind::Iterator
    }
}

///
/// OrderValidation
///
/// Remembers each shard's previous key and reports rows that sort before
/// it. Detection only: output order is not repaired.
///

struct OrderValidation {
    previous: Vec<Option<Vec<Value>>>,
    metrics: Arc<dyn MetricsSink>,
}

impl OrderValidation {
    fn check(&mut self, shard: usize, keys: &[Value], items: &[OrderByItem]) {
        let Some(slot) = self.previous.get_mut(shard) else {
            return;
        };
        if let Some(previous) = slot
            && compare_keys(keys, previous, items) == Ordering::Less
        {
            warn!(
                shard,
                previous = ?previous,
                current = ?keys,
                "shard rows arrived out of ORDER BY order"
            );
            self.metrics.record(MetricsEvent::StreamOrderViolation);
        }
        *slot = Some(keys.to_vec());
    }
}

///
/// OrderByStreamMergedResult
///
/// K-way merge over shard cursors that are each already sorted by the
/// ORDER BY items. Holds one current key per shard and always advances the
/// shard whose row sorts first; ties go to the lower shard index.
///

pub struct OrderByStreamMergedResult<'a> {
    results: Vec<Box<dyn QueryResult + 'a>>,
    items: Arc<[OrderByItem]>,
    heap: BinaryHeap<OrderByValue>,
    current: Option<usize>,
    validation: Option<OrderValidation>,
}

impl<'a> OrderByStreamMergedResult<'a> {
    /// Prime every cursor. With `validation`, out-of-order shard rows are
    /// logged and reported to the sink.
    pub fn new(
        results: Vec<Box<dyn QueryResult + 'a>>,
        items: &[OrderByItem],
        validation: Option<Arc<dyn MetricsSink>>,
    ) -> Result<Self, InternalError> {
        let shard_count = results.len();
        let mut merged = Self {
            results,
            items: items.into(),
            heap: BinaryHeap::with_capacity(shard_count),
            current: None,
            validation: validation.map(|metrics| OrderValidation {
                previous: vec![None; shard_count],
                metrics,
            }),
        };
        for shard in 0..shard_count {
            merged.offer(shard)?;
        }

        Ok(merged)
    }

    // Advance one shard and queue its new current row.
    fn offer(&mut self, shard: usize) -> Result<(), InternalError> {
        let result = &mut self.results[shard];
        if !result.next()? {
            return Ok(());
        }

        let keys = cursor_key(&**result, &self.items)?;
        if let Some(validation) = &mut self.validation {
            validation.check(shard, &keys, &self.items);
        }
        self.heap
            .push(OrderByValue::new(shard, keys, Arc::clone(&self.items)));

        Ok(())
    }
}

impl MergedResult for OrderByStreamMergedResult<'_> {
    fn next(&mut self) -> Result<bool, InternalError> {
        if let Some(shard) = self.current.take() {
            self.offer(shard)?;
        }

        match self.heap.pop() {
            Some(top) => {
                self.current = Some(top.shard);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        let shard = self.current.ok_or_else(no_current_row)?;
        self.results[shard].value(column_index)
    }

    fn column_count(&self) -> usize {
        self.results.first().map_or(0, |result| result.column_count())
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.results.first()?.column_label(column_index)
    }

    fn kind(&self) -> MergeKind {
        MergeKind::OrderByStream
    }
}
