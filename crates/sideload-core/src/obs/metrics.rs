use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for serialization passes.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub types: BTreeMap<String, TypeCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    pub passes_started: u64,
    pub passes_finished: u64,

    // Resources emitted
    pub primaries_emitted: u64,
    pub linked_emitted: u64,

    // Per-entity work
    pub entities_serialized: u64,
    pub identity_hits: u64,
}

///
/// TypeCounters
/// Counters keyed by side-load type key (or entity type name).
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TypeCounters {
    pub serialized: u64,
    pub identity_hits: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
/// Point-in-time counter snapshot with per-type summaries.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    /// Per-type summaries, busiest first.
    pub type_summaries: Vec<TypeSummary>,
}

///
/// TypeSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TypeSummary {
    pub type_key: String,
    pub serialized: u64,
    pub identity_hits: u64,
}

/// Build a report from the current thread's counters.
pub(crate) fn report() -> EventReport {
    with_state(|state| {
        let mut type_summaries: Vec<TypeSummary> = state
            .types
            .iter()
            .map(|(type_key, counters)| TypeSummary {
                type_key: type_key.clone(),
                serialized: counters.serialized,
                identity_hits: counters.identity_hits,
            })
            .collect();
        type_summaries.sort_by(|a, b| {
            b.serialized
                .cmp(&a.serialized)
                .then_with(|| a.type_key.cmp(&b.type_key))
        });

        EventReport {
            counters: state.clone(),
            type_summaries,
        }
    })
}
