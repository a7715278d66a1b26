use crate::{
    condition::routing_parameter_indexes,
    rule::ShardingRule,
    statement::{StatementContext, StatementKind},
};
use std::fmt;

///
/// CacheIneligibleReason
///
/// Why one statement execution bypasses the route cache. Never an error.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CacheIneligibleReason {
    Disabled,
    SqlTooLong,
    StatementKind,
    Hint,
    Subquery,
    GeneratedShardingKey,
    ParameterCountMismatch,
}

impl CacheIneligibleReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Disabled,
        Self::SqlTooLong,
        Self::StatementKind,
        Self::Hint,
        Self::Subquery,
        Self::GeneratedShardingKey,
        Self::ParameterCountMismatch,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::SqlTooLong => "sql_too_long",
            Self::StatementKind => "statement_kind",
            Self::Hint => "hint",
            Self::Subquery => "subquery",
            Self::GeneratedShardingKey => "generated_sharding_key",
            Self::ParameterCountMismatch => "parameter_count_mismatch",
        }
    }
}

impl fmt::Display for CacheIneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Cacheability
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Cacheability {
    Ineligible(CacheIneligibleReason),

    /// Safe to route from cache. `sharding_param_positions` are the bound
    /// parameters that feed routing; the execution must bind exactly
    /// `expected_param_count` parameters.
    Eligible {
        sharding_param_positions: Vec<usize>,
        expected_param_count: usize,
    },
}

///
/// CacheableChecker
///
/// Decides whether a statement shape may be routed from cache.
///

pub trait CacheableChecker: fmt::Debug + Send + Sync {
    fn check(&self, statement: &StatementContext, rule: &ShardingRule) -> Cacheability;
}

///
/// ShardingCacheableChecker
///
/// Excludes statements whose route depends on anything besides the SQL text
/// and the bound parameters: hints, per-execution generated keys. DDL/TCL
/// and subqueries are excluded as well.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ShardingCacheableChecker;

impl CacheableChecker for ShardingCacheableChecker {
    fn check(&self, statement: &StatementContext, rule: &ShardingRule) -> Cacheability {
        if matches!(statement.kind, StatementKind::Ddl | StatementKind::Tcl) {
            return Cacheability::Ineligible(CacheIneligibleReason::StatementKind);
        }
        if statement.hint.is_some() {
            return Cacheability::Ineligible(CacheIneligibleReason::Hint);
        }
        if statement.has_subquery() {
            return Cacheability::Ineligible(CacheIneligibleReason::Subquery);
        }

        let generated_sharding_key = statement
            .insert
            .as_ref()
            .and_then(|insert| insert.generated_keys.as_ref())
            .zip(statement.tables.first())
            .is_some_and(|(keys, table)| rule.is_sharding_column(table, &keys.column));
        if generated_sharding_key {
            return Cacheability::Ineligible(CacheIneligibleReason::GeneratedShardingKey);
        }

        Cacheability::Eligible {
            sharding_param_positions: routing_parameter_indexes(statement, rule),
            expected_param_count: statement.parameter_marker_count,
        }
    }
}
