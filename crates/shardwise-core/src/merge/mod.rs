//! Merge engine: folds per-shard cursors into one logical result.
//!
//! [`merge`] picks a core (iterator, ORDER BY stream or memory, GROUP BY
//! stream or memory) and wraps it in the DISTINCT and pagination decorators
//! the statement needs. Pagination is always outermost.

mod aggregate;
mod compare;
mod decorator;
mod dml;
mod group;
mod memory;
mod result;
mod stream;


use crate::{
    config::MergeConfig,
    error::InternalError,
    obs::{MetricsEvent, MetricsSink, NoopMetricsSink},
    statement::{StatementContext, StatementKind},
    value::Value,
};
use aggregate::aggregate_columns;
use group::group_by_memory;
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::debug;

// re-exports
pub use decorator::{DistinctMergedResult, PaginationMergedResult};
pub use dml::{merge_affected_rows, reassemble_generated_keys};
pub use group::GroupByStreamMergedResult;
pub use memory::MemoryMergedResult;
pub use result::{MemoryQueryResult, MergedResult, QueryResult, chain_kinds};
pub use stream::{IteratorMergedResult, OrderByStreamMergedResult};

///
/// MergeKind
///
/// One layer of a merged result chain.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    Iterator,
    OrderByStream,
    OrderByMemory,
    GroupByStream,
    GroupByMemory,
    Pagination,
    Distinct,
}

impl MergeKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Iterator,
        Self::OrderByStream,
        Self::OrderByMemory,
        Self::GroupByStream,
        Self::GroupByMemory,
        Self::Pagination,
        Self::Distinct,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iterator => "iterator",
            Self::OrderByStream => "order_by_stream",
            Self::OrderByMemory => "order_by_memory",
            Self::GroupByStream => "group_by_stream",
            Self::GroupByMemory => "group_by_memory",
            Self::Pagination => "pagination",
            Self::Distinct => "distinct",
        }
    }

    /// Whether this kind wraps another merged result.
    #[must_use]
    pub const fn is_decorator(self) -> bool {
        matches!(self, Self::Pagination | Self::Distinct)
    }
}

impl fmt::Display for MergeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// MergeOptions
///

#[derive(Clone)]
pub struct MergeOptions {
    /// Check that shard rows really arrive in ORDER BY order when streaming.
    pub validate_stream_order: bool,
    pub metrics: Arc<dyn MetricsSink>,
}

impl MergeOptions {
    #[must_use]
    pub fn new(config: &MergeConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            validate_stream_order: config.validate_stream_order,
            metrics,
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::new(&MergeConfig::default(), Arc::new(NoopMetricsSink))
    }
}

impl fmt::Debug for MergeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOptions")
            .field("validate_stream_order", &self.validate_stream_order)
            .finish_non_exhaustive()
    }
}

/// Merge shard cursors into one logical result.
///
/// `results` are in route unit order. `params` resolve parameterized
/// pagination bounds.
pub fn merge<'a>(
    statement: &StatementContext,
    results: Vec<Box<dyn QueryResult + 'a>>,
    params: &[Value],
    options: &MergeOptions,
) -> Result<Box<dyn MergedResult + 'a>, InternalError> {
    let shard_count = results.len();
    let merged = merge_core(statement, results, options)?;
    let core = merged.kind();

    let merged = decorate(statement, merged, shard_count, params)?;
    options.metrics.record(MetricsEvent::Merge { kind: core });
    debug!(
        shards = shard_count,
        chain = ?chain_kinds(merged.as_ref()),
        "built merged result"
    );

    Ok(merged)
}

fn merge_core<'a>(
    statement: &StatementContext,
    results: Vec<Box<dyn QueryResult + 'a>>,
    options: &MergeOptions,
) -> Result<Box<dyn MergedResult + 'a>, InternalError> {
    if statement.kind != StatementKind::Select
        || (results.len() == 1 && !statement.has_derived_aggregates())
    {
        return Ok(Box::new(IteratorMergedResult::new(results)));
    }

    let validation = options
        .validate_stream_order
        .then(|| Arc::clone(&options.metrics));

    if !statement.group_by.is_empty() || statement.has_aggregates() {
        let columns = aggregate_columns(statement)?;
        let streamable = statement.order_by_pushed_down
            && statement.group_by_matches_order_by()
            && !columns.iter().any(|column| column.is_distinct());

        if streamable {
            let width = results
                .first()
                .map_or(statement.projections.len(), |result| result.column_count());
            return Ok(Box::new(GroupByStreamMergedResult::new(
                results,
                &statement.group_by,
                columns,
                width,
                validation,
            )?));
        }

        let labels = statement
            .projections
            .iter()
            .map(|projection| projection.label.clone())
            .collect();
        return Ok(Box::new(group_by_memory(
            results,
            &statement.group_by,
            &statement.order_by,
            &columns,
            labels,
        )?));
    }

    if !statement.order_by.is_empty() {
        if statement.order_by_pushed_down {
            return Ok(Box::new(OrderByStreamMergedResult::new(
                results,
                &statement.order_by,
                validation,
            )?));
        }
        return Ok(Box::new(MemoryMergedResult::order_by(
            results,
            &statement.order_by,
        )?));
    }

    Ok(Box::new(IteratorMergedResult::new(results)))
}

fn decorate<'a>(
    statement: &StatementContext,
    merged: Box<dyn MergedResult + 'a>,
    shard_count: usize,
    params: &[Value],
) -> Result<Box<dyn MergedResult + 'a>, InternalError> {
    // A lone shard already applied DISTINCT and LIMIT itself.
    if shard_count <= 1 {
        return Ok(merged);
    }

    let mut merged = merged;
    if statement.distinct {
        merged = Box::new(DistinctMergedResult::new(merged));
    }
    if let Some(pagination) = &statement.pagination {
        merged = Box::new(PaginationMergedResult::new(
            merged,
            pagination.resolve(params)?,
        ));
    }

    Ok(merged)
}
