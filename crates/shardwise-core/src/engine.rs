//! Engine facade: one rule, one route cache, one metrics sink.
//!
//! [`ShardingEngine`] is the explicitly constructed owner of the route
//! cache. The free functions below are the stateless forms for callers that
//! manage their own rule and cache.

use crate::{
    cache::{self, CacheIneligibleReason, CacheableChecker, RouteCache},
    condition,
    config::EngineConfig,
    error::InternalError,
    merge::{self, MergeOptions, MergedResult, QueryResult},
    obs::{MetricsEvent, MetricsSink, NoopMetricsSink},
    route::{self, RouteContext},
    rule::ShardingRule,
    statement::StatementContext,
    value::Value,
};
use std::{fmt, sync::Arc};
use tracing::debug;

/// Route a bound statement without caching.
pub fn route(
    statement: &StatementContext,
    params: &[Value],
    rule: &ShardingRule,
) -> Result<RouteContext, InternalError> {
    let conditions = condition::extract(statement, params, rule)?;

    route::route(statement, &conditions, rule, false)
}

/// Route through `cache`. `Ok(None)` means the statement is not eligible;
/// call [`route`] instead.
pub fn route_cached(
    statement: &StatementContext,
    params: &[Value],
    rule: &ShardingRule,
    cache: &RouteCache,
) -> Result<Option<RouteContext>, InternalError> {
    cache::route_cached(statement, params, rule, cache, false, &NoopMetricsSink)
}

/// Merge shard cursors with default options.
pub fn merge<'a>(
    statement: &StatementContext,
    results: Vec<Box<dyn QueryResult + 'a>>,
) -> Result<Box<dyn MergedResult + 'a>, InternalError> {
    merge::merge(statement, results, &[], &MergeOptions::default())
}

///
/// ShardingEngine
///

pub struct ShardingEngine {
    rule: Arc<ShardingRule>,
    config: EngineConfig,
    cache: Option<RouteCache>,
    metrics: Arc<dyn MetricsSink>,
}

impl ShardingEngine {
    #[must_use]
    pub fn new(rule: ShardingRule, config: EngineConfig) -> Self {
        Self::with_shared_rule(Arc::new(rule), config)
    }

    /// Engine over a rule shared with other engines.
    #[must_use]
    pub fn with_shared_rule(rule: Arc<ShardingRule>, config: EngineConfig) -> Self {
        let cache = config
            .route_cache
            .enabled
            .then(|| RouteCache::from_config(&config.route_cache));

        Self {
            rule,
            config,
            cache,
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the cacheability checker. No effect with caching disabled.
    #[must_use]
    pub fn with_cacheable_checker(mut self, checker: Arc<dyn CacheableChecker>) -> Self {
        self.cache = self.cache.map(|cache| cache.with_checker(checker));
        self
    }

    #[must_use]
    pub fn rule(&self) -> &ShardingRule {
        &self.rule
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn cache(&self) -> Option<&RouteCache> {
        self.cache.as_ref()
    }

    /// Route without consulting the cache.
    pub fn route(
        &self,
        statement: &StatementContext,
        params: &[Value],
    ) -> Result<RouteContext, InternalError> {
        let conditions = condition::extract(statement, params, &self.rule)?;
        let context = route::route(
            statement,
            &conditions,
            &self.rule,
            self.config.allow_range_conditions,
        )?;
        self.record_route(&context);

        Ok(context)
    }

    /// Route through the cache. `Ok(None)` when caching is disabled or the
    /// statement is not eligible.
    pub fn route_cached(
        &self,
        statement: &StatementContext,
        params: &[Value],
    ) -> Result<Option<RouteContext>, InternalError> {
        let Some(cache) = &self.cache else {
            self.metrics.record(MetricsEvent::RouteCacheIneligible {
                reason: CacheIneligibleReason::Disabled,
            });
            return Ok(None);
        };

        let context = cache::route_cached(
            statement,
            params,
            &self.rule,
            cache,
            self.config.allow_range_conditions,
            self.metrics.as_ref(),
        )?;
        if let Some(context) = &context {
            self.record_route(context);
        }

        Ok(context)
    }

    /// Route through the cache when eligible, directly otherwise.
    pub fn resolve_route(
        &self,
        statement: &StatementContext,
        params: &[Value],
    ) -> Result<RouteContext, InternalError> {
        match self.route_cached(statement, params)? {
            Some(context) => Ok(context),
            None => self.route(statement, params),
        }
    }

    /// Merge shard cursors in route unit order.
    pub fn merge<'a>(
        &self,
        statement: &StatementContext,
        results: Vec<Box<dyn QueryResult + 'a>>,
        params: &[Value],
    ) -> Result<Box<dyn MergedResult + 'a>, InternalError> {
        let options = MergeOptions::new(&self.config.merge, Arc::clone(&self.metrics));

        merge::merge(statement, results, params, &options)
    }

    fn record_route(&self, context: &RouteContext) {
        debug!(
            strategy = %context.strategy(),
            units = context.route_units().len(),
            "routed statement"
        );
        self.metrics.record(MetricsEvent::Route {
            strategy: context.strategy(),
            units: context.route_units().len() as u64,
        });
    }
}

impl fmt::Debug for ShardingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardingEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RouteCacheConfig,
        merge::MemoryQueryResult,
        obs::AtomicMetricsSink,
        statement::{Expr, Operand, OrderByItem},
        test_support::rule,
    };

    fn select_by_user() -> StatementContext {
        StatementContext::select("SELECT * FROM t_order WHERE user_id = ? ORDER BY c0")
            .with_tables(&["t_order"])
            .with_where(Expr::equals("user_id", Operand::param(0)))
            .with_order_by(vec![OrderByItem::asc(0)])
            .with_parameter_markers(1)
    }

    #[test]
    fn resolve_route_prefers_the_cache() {
        let sink = Arc::new(AtomicMetricsSink::new());
        let engine =
            ShardingEngine::new(rule(), EngineConfig::default()).with_metrics(Arc::clone(&sink) as _);

        let first = engine.resolve_route(&select_by_user(), &[Value::Int(1)]).expect("route");
        let second = engine.resolve_route(&select_by_user(), &[Value::Int(1)]).expect("route");

        assert_eq!(first, second);
        assert_eq!(first.data_sources(), vec!["ds_1"]);
        let report = sink.report();
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.routes.get("standard"), Some(&2));
    }

    #[test]
    fn disabled_cache_reports_ineligible() {
        let sink = Arc::new(AtomicMetricsSink::new());
        let config = EngineConfig {
            route_cache: RouteCacheConfig {
                enabled: false,
                ..RouteCacheConfig::default()
            },
            ..EngineConfig::default()
        };
        let engine = ShardingEngine::new(rule(), config).with_metrics(Arc::clone(&sink) as _);

        assert!(engine.cache().is_none());
        assert!(
            engine
                .route_cached(&select_by_user(), &[Value::Int(1)])
                .expect("not an error")
                .is_none()
        );
        let context = engine
            .resolve_route(&select_by_user(), &[Value::Int(1)])
            .expect("route");

        assert_eq!(context.route_units().len(), 2);
        assert_eq!(sink.report().cache_ineligible.get("disabled"), Some(&2));
    }

    #[test]
    fn free_functions_agree_with_the_engine() {
        let rule = rule();
        let cache = RouteCache::new(8, 1024);
        let params = [Value::Int(0)];

        let direct = route(&select_by_user(), &params, &rule).expect("route");
        let cached = route_cached(&select_by_user(), &params, &rule, &cache)
            .expect("route")
            .expect("eligible");

        assert_eq!(direct, cached);
        assert_eq!(direct.data_sources(), vec!["ds_0"]);
    }

    #[test]
    fn engine_merge_records_the_core_kind() {
        let sink = Arc::new(AtomicMetricsSink::new());
        let engine =
            ShardingEngine::new(rule(), EngineConfig::default()).with_metrics(Arc::clone(&sink) as _);
        let results: Vec<Box<dyn QueryResult>> = vec![
            Box::new(MemoryQueryResult::of_ints(&[&[1], &[3]])),
            Box::new(MemoryQueryResult::of_ints(&[&[2]])),
        ];

        let mut merged = engine
            .merge(&select_by_user(), results, &[])
            .expect("merge");
        let mut values = Vec::new();
        while merged.next().expect("next") {
            values.push(merged.value(0).expect("value").clone());
        }

        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(sink.report().merges.get("order_by_stream"), Some(&1));
    }
}
