//! Observability: metrics events and sink abstractions.
//!
//! Engine code never touches counters directly. Every measurement flows
//! through a [`MetricsEvent`] handed to an injected [`MetricsSink`].

mod metrics;
mod sink;

#[cfg(test)]
mod tests;

// re-exports
pub use metrics::{AtomicMetricsSink, MetricsReport};
pub use sink::{MetricsEvent, MetricsSink, NoopMetricsSink};
