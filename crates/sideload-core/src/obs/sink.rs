//! Metrics sink boundary.
//!
//! Serialization logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    PassStart {
        root_key: &'a str,
    },
    PassFinish {
        root_key: &'a str,
        primaries: u64,
        linked: u64,
    },
    EntitySerialized {
        type_key: &'a str,
    },
    IdentityHit {
        type_key: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counters.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::PassStart { .. } => {
                m.ops.passes_started = m.ops.passes_started.saturating_add(1);
            }
            MetricsEvent::PassFinish {
                primaries, linked, ..
            } => {
                m.ops.passes_finished = m.ops.passes_finished.saturating_add(1);
                m.ops.primaries_emitted = m.ops.primaries_emitted.saturating_add(primaries);
                m.ops.linked_emitted = m.ops.linked_emitted.saturating_add(linked);
            }
            MetricsEvent::EntitySerialized { type_key } => {
                m.ops.entities_serialized = m.ops.entities_serialized.saturating_add(1);
                let entry = m.types.entry(type_key.to_string()).or_default();
                entry.serialized = entry.serialized.saturating_add(1);
            }
            MetricsEvent::IdentityHit { type_key } => {
                m.ops.identity_hits = m.ops.identity_hits.saturating_add(1);
                let entry = m.types.entry(type_key.to_string()).or_default();
                entry.identity_hits = entry.identity_hits.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself install overrides.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's serialization counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
