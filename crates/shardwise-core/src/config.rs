//! Engine tuning knobs. Rule configuration lives in [`crate::rule`].

use serde::Deserialize;

/// Default route cache capacity, in entries.
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 1024;

/// Default longest SQL text, in bytes, eligible for route caching.
pub const DEFAULT_MAX_SQL_LENGTH: usize = 8192;

///
/// EngineConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub route_cache: RouteCacheConfig,
    pub merge: MergeConfig,

    /// Let BETWEEN and inequality predicates narrow routing for algorithms
    /// that support ranges. Off: such predicates route to every candidate.
    pub allow_range_conditions: bool,
}

///
/// RouteCacheConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RouteCacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub max_sql_length: usize,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
            max_sql_length: DEFAULT_MAX_SQL_LENGTH,
        }
    }
}

///
/// MergeConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Check that shard rows arrive in ORDER BY order during stream merges.
    /// Violations are logged and counted, never raised.
    pub validate_stream_order: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            validate_stream_order: cfg!(debug_assertions),
        }
    }
}
