//! Metrics sink boundary.
//!
//! Routing, caching and merging report what they did through
//! [`MetricsEvent`]; the sink decides what to keep. There is no global sink:
//! callers pass one in.

use crate::{cache::CacheIneligibleReason, merge::MergeKind, route::RouteStrategyKind};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Route {
        strategy: RouteStrategyKind,
        units: u64,
    },
    RouteCacheHit,
    RouteCacheMiss,
    RouteCacheIneligible {
        reason: CacheIneligibleReason,
    },
    RouteCacheEviction {
        evicted: u64,
    },
    Merge {
        kind: MergeKind,
    },
    StreamOrderViolation,
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// NoopMetricsSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _event: MetricsEvent) {}
}
