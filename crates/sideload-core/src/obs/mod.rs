//! Observability: per-thread serialization counters and sink abstractions.
//!
//! The engine never touches counters directly; every signal flows through
//! `sink::record` as a `MetricsEvent`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, TypeCounters, TypeSummary};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
