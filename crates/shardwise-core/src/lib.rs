//! Sharding core for SQL middleware: sharding rules and algorithms, routing
//! condition extraction, the routing engine, a bounded route cache, and the
//! merge engine that folds per-shard cursors into one logical result.
//!
//! Parsing, rewriting and execution live outside this crate. Callers hand in
//! a bound [`statement::StatementContext`] and get back a
//! [`route::RouteContext`]; after execution they hand in one
//! [`merge::QueryResult`] per route unit and read one
//! [`merge::MergedResult`].

// public exports are one module level down
pub mod algorithm;
pub mod cache;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod obs;
pub mod route;
pub mod rule;
pub mod statement;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only. Errors, sinks and individual merge cursors stay
/// behind their modules.
///

pub mod prelude {
    pub use crate::{
        cache::RouteCache,
        config::EngineConfig,
        engine::ShardingEngine,
        merge::{MergedResult, QueryResult},
        route::{RouteContext, RouteUnit},
        rule::{ShardingRule, ShardingRuleConfig},
        statement::{Expr, Operand, StatementContext, StatementKind},
        value::Value,
    };
}
