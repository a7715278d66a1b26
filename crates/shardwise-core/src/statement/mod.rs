//! Bound statement model produced by the parsing/binding layer.
//!
//! Only the shape that routing and merging consume is modelled: statement
//! kind, referenced logical tables, the predicate tree, insert values, the
//! projection list and the ORDER BY / GROUP BY / pagination clauses.

mod expr;
mod projection;


use crate::value::Value;

// re-exports
pub use expr::{ColumnRef, CompareOp, Expr, Operand};
pub use projection::{
    AggregateKind, AggregateProjection, AvgColumns, Direction, OrderByItem, Pagination,
    PaginationBound, PaginationKind, PaginationValue, Projection, ResolvedPagination,
};

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Tcl,
}

impl StatementKind {
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::Select)
    }

    #[must_use]
    pub const fn is_dml(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

///
/// InsertValues
///
/// Column list and value rows of an INSERT. Generated keys, when an external
/// key generator filled a column absent from the column list, carry one value
/// per row in row order.
///

#[derive(Clone, Debug, Default)]
pub struct InsertValues {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Operand>>,
    pub generated_keys: Option<GeneratedKeys>,
}

///
/// GeneratedKeys
///

#[derive(Clone, Debug)]
pub struct GeneratedKeys {
    pub column: String,
    pub values: Vec<Value>,
}

///
/// StatementHint
///
/// Routing values attached to a statement instead of derived from it.
///

#[derive(Clone, Debug)]
pub enum StatementHint {
    /// Values for hint sharding strategies, per dimension.
    Sharding {
        database_values: Vec<Value>,
        table_values: Vec<Value>,
    },

    /// Route the whole statement to one named data source.
    DataSource(String),
}

///
/// StatementContext
///

#[derive(Clone, Debug)]
pub struct StatementContext {
    pub kind: StatementKind,
    pub sql: String,
    pub tables: Vec<String>,
    pub where_clause: Option<Expr>,
    pub subquery_predicates: Vec<Expr>,
    pub insert: Option<InsertValues>,
    pub projections: Vec<Projection>,
    pub group_by: Vec<OrderByItem>,
    pub order_by: Vec<OrderByItem>,
    pub pagination: Option<Pagination>,
    pub distinct: bool,

    /// Whether every shard already returns rows in ORDER BY (or GROUP BY)
    /// order, which streaming merges rely on.
    pub order_by_pushed_down: bool,
    pub parameter_marker_count: usize,
    pub hint: Option<StatementHint>,
}

impl StatementContext {
    #[must_use]
    pub fn new(kind: StatementKind, sql: &str) -> Self {
        Self {
            kind,
            sql: sql.to_string(),
            tables: Vec::new(),
            where_clause: None,
            subquery_predicates: Vec::new(),
            insert: None,
            projections: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            pagination: None,
            distinct: false,
            order_by_pushed_down: true,
            parameter_marker_count: 0,
            hint: None,
        }
    }

    #[must_use]
    pub fn select(sql: &str) -> Self {
        Self::new(StatementKind::Select, sql)
    }

    #[must_use]
    pub fn insert(sql: &str, table: &str, values: InsertValues) -> Self {
        let mut statement = Self::new(StatementKind::Insert, sql).with_tables(&[table]);
        statement.insert = Some(values);
        statement
    }

    #[must_use]
    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    #[must_use]
    pub fn with_subquery_predicate(mut self, expr: Expr) -> Self {
        self.subquery_predicates.push(expr);
        self
    }

    #[must_use]
    pub fn with_projections(mut self, projections: Vec<Projection>) -> Self {
        self.projections = projections;
        self
    }

    #[must_use]
    pub fn with_group_by(mut self, items: Vec<OrderByItem>) -> Self {
        self.group_by = items;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, items: Vec<OrderByItem>) -> Self {
        self.order_by = items;
        self
    }

    #[must_use]
    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    #[must_use]
    pub const fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub const fn with_order_by_pushed_down(mut self, pushed_down: bool) -> Self {
        self.order_by_pushed_down = pushed_down;
        self
    }

    #[must_use]
    pub const fn with_parameter_markers(mut self, count: usize) -> Self {
        self.parameter_marker_count = count;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: StatementHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Aggregate projections with their result column index.
    pub fn aggregates(&self) -> impl Iterator<Item = (usize, &AggregateProjection)> {
        self.projections
            .iter()
            .enumerate()
            .filter_map(|(index, projection)| projection.aggregate().map(|agg| (index, agg)))
    }

    #[must_use]
    pub fn has_aggregates(&self) -> bool {
        self.aggregates().next().is_some()
    }

    /// Whether some aggregate needs values the shards did not return as-is
    /// (AVG from derived SUM/COUNT columns, or DISTINCT aggregates).
    #[must_use]
    pub fn has_derived_aggregates(&self) -> bool {
        self.aggregates()
            .any(|(_, agg)| agg.distinct || agg.kind == AggregateKind::Avg)
    }

    /// Whether GROUP BY and ORDER BY name the same items in the same order,
    /// which lets a streaming group merge emit groups in final order.
    #[must_use]
    pub fn group_by_matches_order_by(&self) -> bool {
        self.order_by.is_empty() || self.group_by == self.order_by
    }

    /// Whether predicate groups from subqueries take part in routing.
    #[must_use]
    pub fn has_subquery(&self) -> bool {
        !self.subquery_predicates.is_empty()
    }
}
