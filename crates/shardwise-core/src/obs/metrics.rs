use crate::{
    cache::CacheIneligibleReason,
    merge::MergeKind,
    obs::sink::{MetricsEvent, MetricsSink},
    route::RouteStrategyKind,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

///
/// AtomicMetricsSink
///
/// Lock-free in-memory counters. Safe to share between query threads.
///

#[derive(Debug, Default)]
pub struct AtomicMetricsSink {
    routes: [AtomicU64; RouteStrategyKind::ALL.len()],
    route_units: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_evictions: AtomicU64,
    cache_ineligible: [AtomicU64; CacheIneligibleReason::ALL.len()],
    merges: [AtomicU64; MergeKind::ALL.len()],
    stream_order_violations: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

fn load(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

// Non-zero counters keyed by label.
fn labelled<K: Copy>(
    kinds: &[K],
    counters: &[AtomicU64],
    label: impl Fn(K) -> &'static str,
) -> BTreeMap<String, u64> {
    kinds
        .iter()
        .zip(counters)
        .filter_map(|(kind, counter)| {
            let value = load(counter);
            (value > 0).then(|| (label(*kind).to_string(), value))
        })
        .collect()
}

impl AtomicMetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time snapshot.
    #[must_use]
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            routes: labelled(&RouteStrategyKind::ALL, &self.routes, RouteStrategyKind::as_str),
            route_units: load(&self.route_units),
            cache_hits: load(&self.cache_hits),
            cache_misses: load(&self.cache_misses),
            cache_evictions: load(&self.cache_evictions),
            cache_ineligible: labelled(
                &CacheIneligibleReason::ALL,
                &self.cache_ineligible,
                CacheIneligibleReason::as_str,
            ),
            merges: labelled(&MergeKind::ALL, &self.merges, MergeKind::as_str),
            stream_order_violations: load(&self.stream_order_violations),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in self
            .routes
            .iter()
            .chain(&self.cache_ineligible)
            .chain(&self.merges)
            .chain([
                &self.route_units,
                &self.cache_hits,
                &self.cache_misses,
                &self.cache_evictions,
                &self.stream_order_violations,
            ])
        {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl MetricsSink for AtomicMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::Route { strategy, units } => {
                bump(&self.routes[strategy as usize], 1);
                bump(&self.route_units, units);
            }
            MetricsEvent::RouteCacheHit => bump(&self.cache_hits, 1),
            MetricsEvent::RouteCacheMiss => bump(&self.cache_misses, 1),
            MetricsEvent::RouteCacheIneligible { reason } => {
                bump(&self.cache_ineligible[reason as usize], 1);
            }
            MetricsEvent::RouteCacheEviction { evicted } => bump(&self.cache_evictions, evicted),
            MetricsEvent::Merge { kind } => bump(&self.merges[kind as usize], 1),
            MetricsEvent::StreamOrderViolation => bump(&self.stream_order_violations, 1),
        }
    }
}

///
/// MetricsReport
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub routes: BTreeMap<String, u64>,
    pub route_units: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub cache_ineligible: BTreeMap<String, u64>,
    pub merges: BTreeMap<String, u64>,
    pub stream_order_violations: u64,
}
