use crate::{
    cache::CacheIneligibleReason,
    merge::MergeKind,
    obs::{AtomicMetricsSink, MetricsEvent, MetricsSink},
    route::RouteStrategyKind,
};

#[test]
fn atomic_sink_counts_events_by_label() {
    let sink = AtomicMetricsSink::new();
    sink.record(MetricsEvent::Route {
        strategy: RouteStrategyKind::Standard,
        units: 3,
    });
    sink.record(MetricsEvent::Route {
        strategy: RouteStrategyKind::Standard,
        units: 1,
    });
    sink.record(MetricsEvent::RouteCacheMiss);
    sink.record(MetricsEvent::RouteCacheHit);
    sink.record(MetricsEvent::RouteCacheIneligible {
        reason: CacheIneligibleReason::SqlTooLong,
    });
    sink.record(MetricsEvent::RouteCacheEviction { evicted: 2 });
    sink.record(MetricsEvent::Merge {
        kind: MergeKind::OrderByStream,
    });
    sink.record(MetricsEvent::StreamOrderViolation);

    let report = sink.report();
    assert_eq!(report.routes.get("standard"), Some(&2));
    assert_eq!(report.route_units, 4);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.cache_misses, 1);
    assert_eq!(report.cache_evictions, 2);
    assert_eq!(report.cache_ineligible.get("sql_too_long"), Some(&1));
    assert_eq!(report.merges.get("order_by_stream"), Some(&1));
    assert_eq!(report.stream_order_violations, 1);
    assert!(!report.routes.contains_key("cartesian"));
}

#[test]
fn reset_zeroes_every_counter() {
    let sink = AtomicMetricsSink::new();
    sink.record(MetricsEvent::RouteCacheHit);
    sink.record(MetricsEvent::Merge {
        kind: MergeKind::Iterator,
    });

    sink.reset();

    assert_eq!(sink.report(), crate::obs::MetricsReport::default());
}

#[test]
fn report_serializes_to_json() {
    let sink = AtomicMetricsSink::new();
    sink.record(MetricsEvent::RouteCacheHit);

    let json = serde_json::to_value(sink.report()).expect("serialize");
    assert_eq!(json["cache_hits"], 1);
}
