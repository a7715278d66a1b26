//! Route cache: bounded memoization in front of the routing engine.
//!
//! Entries are immutable `RouteContext` snapshots; every hit hands out a
//! copy, so callers may rewrite their units freely.

mod checker;
mod key;


use crate::{
    condition,
    config::RouteCacheConfig,
    error::InternalError,
    obs::{MetricsEvent, MetricsSink},
    route::{self, RouteContext},
    rule::ShardingRule,
    statement::StatementContext,
    value::Value,
};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::debug;

// re-exports
pub use checker::{
    CacheIneligibleReason, Cacheability, CacheableChecker, ShardingCacheableChecker,
};
pub use key::RouteCacheKey;

///
/// CacheEntry
///

struct CacheEntry {
    context: Arc<RouteContext>,
    last_used: AtomicU64,
}

///
/// RouteCache
///
/// Size-bounded map with least-recently-used eviction. Reads share a lock
/// and bump an atomic recency tick; inserts and evictions take it
/// exclusively. Capacity zero caches nothing.
///

pub struct RouteCache {
    capacity: usize,
    max_sql_length: usize,
    checker: Arc<dyn CacheableChecker>,
    entries: RwLock<HashMap<RouteCacheKey, CacheEntry>>,
    clock: AtomicU64,
}

impl RouteCache {
    #[must_use]
    pub fn new(capacity: usize, max_sql_length: usize) -> Self {
        Self {
            capacity,
            max_sql_length,
            checker: Arc::new(ShardingCacheableChecker),
            entries: RwLock::new(HashMap::with_capacity(capacity.min(1024))),
            clock: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: &RouteCacheConfig) -> Self {
        Self::new(config.capacity, config.max_sql_length)
    }

    /// Replace the cacheable checker.
    #[must_use]
    pub fn with_checker(mut self, checker: Arc<dyn CacheableChecker>) -> Self {
        self.checker = checker;
        self
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Gate checked before any lookup. `Ok` carries the routing parameter
    /// positions for the key.
    pub fn eligibility(
        &self,
        statement: &StatementContext,
        params: &[Value],
        rule: &ShardingRule,
    ) -> Result<Vec<usize>, CacheIneligibleReason> {
        if statement.sql.len() > self.max_sql_length {
            return Err(CacheIneligibleReason::SqlTooLong);
        }

        match self.checker.check(statement, rule) {
            Cacheability::Ineligible(reason) => Err(reason),
            Cacheability::Eligible {
                expected_param_count,
                ..
            } if expected_param_count != params.len() => {
                Err(CacheIneligibleReason::ParameterCountMismatch)
            }
            Cacheability::Eligible {
                sharding_param_positions,
                ..
            } => Ok(sharding_param_positions),
        }
    }

    /// Copy of the cached context for `key`.
    #[must_use]
    pub fn get(&self, key: &RouteCacheKey) -> Option<RouteContext> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);

        Some(entry.context.as_ref().clone())
    }

    /// Insert or replace an entry, evicting the least recently used one when
    /// full. Returns the number of evicted entries.
    pub fn put(&self, key: RouteCacheKey, context: RouteContext) -> usize {
        if self.capacity == 0 {
            return 0;
        }

        let entry = CacheEntry {
            context: Arc::new(context),
            last_used: AtomicU64::new(self.tick()),
        };

        let mut entries = self.entries.write();
        let mut evicted = 0;
        if !entries.contains_key(&key) {
            while entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, cached)| cached.last_used.load(Ordering::Relaxed))
                    .map(|(candidate, _)| *candidate);
                let Some(oldest) = oldest else {
                    break;
                };
                entries.remove(&oldest);
                evicted += 1;
            }
        }
        entries.insert(key, entry);

        evicted
    }
}

impl fmt::Debug for RouteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCache")
            .field("capacity", &self.capacity)
            .field("max_sql_length", &self.max_sql_length)
            .field("checker", &self.checker)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Route through the cache.
///
/// `Ok(None)` means the execution is not eligible for cached routing and
/// the caller must route directly. A miss routes, stores and returns the
/// fresh context.
pub fn route_cached(
    statement: &StatementContext,
    params: &[Value],
    rule: &ShardingRule,
    cache: &RouteCache,
    allow_range: bool,
    metrics: &dyn MetricsSink,
) -> Result<Option<RouteContext>, InternalError> {
    let positions = match cache.eligibility(statement, params, rule) {
        Ok(positions) => positions,
        Err(reason) => {
            debug!(%reason, sql_len = statement.sql.len(), "route cache ineligible");
            metrics.record(MetricsEvent::RouteCacheIneligible { reason });
            return Ok(None);
        }
    };

    let key = RouteCacheKey::new(rule.fingerprint(), &statement.sql, &positions, params);
    if let Some(context) = cache.get(&key) {
        debug!(%key, "route cache hit");
        metrics.record(MetricsEvent::RouteCacheHit);
        return Ok(Some(context));
    }

    debug!(%key, "route cache miss");
    metrics.record(MetricsEvent::RouteCacheMiss);

    let conditions = condition::extract(statement, params, rule)?;
    let context = route::route(statement, &conditions, rule, allow_range)?;
    let evicted = cache.put(key, context.clone());
    if evicted > 0 {
        metrics.record(MetricsEvent::RouteCacheEviction {
            evicted: evicted as u64,
        });
    }

    Ok(Some(context))
}
