use crate::{
    error::InternalError,
    value::{Collation, Value},
};

///
/// AggregateKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateKind {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
        }
    }
}

///
/// AggregateProjection
///
/// One aggregate in the projection list.
///
/// Shards return partial aggregates in the aggregate's own column. `AVG` is
/// rewritten upstream into a derived `SUM`/`COUNT` pair at `avg_columns`; a
/// DISTINCT aggregate receives one raw argument value per shard row instead
/// (shards group by the argument), so values can be deduplicated across
/// shards.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateProjection {
    pub kind: AggregateKind,
    pub distinct: bool,
    pub avg_columns: Option<AvgColumns>,
}

///
/// AvgColumns
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AvgColumns {
    pub sum_index: usize,
    pub count_index: usize,
}

///
/// Projection
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Projection {
    pub label: String,
    pub aggregate: Option<AggregateProjection>,
}

impl Projection {
    #[must_use]
    pub fn column(label: &str) -> Self {
        Self {
            label: label.to_string(),
            aggregate: None,
        }
    }

    #[must_use]
    pub fn aggregate_of(label: &str, kind: AggregateKind) -> Self {
        Self {
            label: label.to_string(),
            aggregate: Some(AggregateProjection {
                kind,
                distinct: false,
                avg_columns: None,
            }),
        }
    }

    #[must_use]
    pub fn distinct_aggregate(label: &str, kind: AggregateKind) -> Self {
        Self {
            label: label.to_string(),
            aggregate: Some(AggregateProjection {
                kind,
                distinct: true,
                avg_columns: None,
            }),
        }
    }

    /// `AVG` computed from derived SUM and COUNT result columns.
    #[must_use]
    pub fn avg(label: &str, sum_index: usize, count_index: usize) -> Self {
        Self {
            label: label.to_string(),
            aggregate: Some(AggregateProjection {
                kind: AggregateKind::Avg,
                distinct: false,
                avg_columns: Some(AvgColumns {
                    sum_index,
                    count_index,
                }),
            }),
        }
    }

    #[must_use]
    pub const fn aggregate(&self) -> Option<&AggregateProjection> {
        self.aggregate.as_ref()
    }
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

///
/// OrderByItem
///
/// One ORDER BY or GROUP BY key: a 0-based result column plus direction and
/// text collation. Nulls sort first ascending and last descending.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OrderByItem {
    pub column_index: usize,
    pub direction: Direction,
    pub collation: Collation,
}

impl OrderByItem {
    #[must_use]
    pub const fn asc(column_index: usize) -> Self {
        Self {
            column_index,
            direction: Direction::Asc,
            collation: Collation::Binary,
        }
    }

    #[must_use]
    pub const fn desc(column_index: usize) -> Self {
        Self {
            column_index,
            direction: Direction::Desc,
            collation: Collation::Binary,
        }
    }

    #[must_use]
    pub const fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }
}

///
/// PaginationKind
///
/// Dialect of the pagination clause.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaginationKind {
    /// `LIMIT count OFFSET offset`: offset is a skip count.
    Limit,

    /// `TOP n` with an optional `ROW_NUMBER() > offset` outer filter.
    Top,

    /// `ROWNUM > offset AND ROWNUM <= end`: both bounds are row numbers.
    RowNumber,
}

impl PaginationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Top => "top",
            Self::RowNumber => "row_number",
        }
    }
}

///
/// PaginationValue
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaginationValue {
    Literal(u64),
    Param(usize),
}

///
/// PaginationBound
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PaginationBound {
    pub value: PaginationValue,
    pub inclusive: bool,
}

impl PaginationBound {
    #[must_use]
    pub const fn literal(value: u64, inclusive: bool) -> Self {
        Self {
            value: PaginationValue::Literal(value),
            inclusive,
        }
    }

    #[must_use]
    pub const fn param(index: usize, inclusive: bool) -> Self {
        Self {
            value: PaginationValue::Param(index),
            inclusive,
        }
    }

    fn resolve(self, params: &[Value]) -> Result<u64, InternalError> {
        match self.value {
            PaginationValue::Literal(value) => Ok(value),
            PaginationValue::Param(index) => {
                let value = params.get(index).ok_or_else(|| {
                    InternalError::merge_invariant(format!(
                        "pagination parameter {index} has no bound value"
                    ))
                })?;

                value
                    .to_i128()
                    .and_then(|value| u64::try_from(value).ok())
                    .ok_or_else(|| {
                        InternalError::merge_unsupported(format!(
                            "pagination value {value} is not a non-negative integer"
                        ))
                    })
            }
        }
    }
}

///
/// Pagination
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pagination {
    pub kind: PaginationKind,
    pub offset: Option<PaginationBound>,
    pub row_count: Option<PaginationBound>,
}

impl Pagination {
    /// `LIMIT row_count OFFSET offset`.
    #[must_use]
    pub const fn limit(offset: Option<u64>, row_count: Option<u64>) -> Self {
        Self {
            kind: PaginationKind::Limit,
            offset: match offset {
                Some(value) => Some(PaginationBound::literal(value, false)),
                None => None,
            },
            row_count: match row_count {
                Some(value) => Some(PaginationBound::literal(value, false)),
                None => None,
            },
        }
    }

    /// `TOP end` with an optional row-number lower bound.
    #[must_use]
    pub const fn top(end: u64, offset: Option<PaginationBound>) -> Self {
        Self {
            kind: PaginationKind::Top,
            offset,
            row_count: Some(PaginationBound::literal(end, true)),
        }
    }

    /// `ROWNUM` bounds.
    #[must_use]
    pub const fn row_number(
        offset: Option<PaginationBound>,
        end: Option<PaginationBound>,
    ) -> Self {
        Self {
            kind: PaginationKind::RowNumber,
            offset,
            row_count: end,
        }
    }

    /// Resolve into `(rows to skip, rows to emit)`.
    pub fn resolve(&self, params: &[Value]) -> Result<ResolvedPagination, InternalError> {
        let offset = self.offset.map(|bound| bound.resolve(params)).transpose()?;
        let row_count = self
            .row_count
            .map(|bound| bound.resolve(params))
            .transpose()?;

        let resolved = match self.kind {
            PaginationKind::Limit => ResolvedPagination {
                skip: offset.unwrap_or(0),
                take: row_count,
            },
            PaginationKind::Top | PaginationKind::RowNumber => {
                let skip = match (self.offset, offset) {
                    (Some(bound), Some(value)) if bound.inclusive => value.saturating_sub(1),
                    (_, value) => value.unwrap_or(0),
                };
                let end = match (self.row_count, row_count) {
                    (Some(bound), Some(value)) if !bound.inclusive => Some(value.saturating_sub(1)),
                    (_, value) => value,
                };

                ResolvedPagination {
                    skip,
                    take: end.map(|end| end.saturating_sub(skip)),
                }
            }
        };

        Ok(resolved)
    }
}

///
/// ResolvedPagination
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolvedPagination {
    pub skip: u64,
    pub take: Option<u64>,
}
