//! # Validation Scheduling and Routing
//!
//! Edits do not validate immediately: a debounce timer coalesces bursts of
//! changes into one round-trip, and at most one validation call is ever in
//! flight. The scheduler is an explicit state machine over host-supplied
//! milliseconds; the host pumps it from its event loop and performs the
//! actual call.
//!
//! Responses are routed field-by-field: each raw error path is decoded
//! leniently, resolved against the handler tree, and forwarded to the owning
//! slot. Paths with no matching handler are logged and dropped.

use crate::binding::SlotBinding;
use crate::handlers::HandlerTree;
use facet_model::AttributePath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Delay between the last edit and the validation round-trip.
pub const VALIDATION_DEBOUNCE_MS: u64 = 300;

/// Debounce plus single-flight gate for validation calls.
#[derive(Debug)]
pub struct ValidationScheduler {
    debounce_ms: u64,
    deadline: Option<u64>,
    in_flight: bool,
}

impl ValidationScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            deadline: None,
            in_flight: false,
        }
    }

    /// A change happened: cancel any armed timer and rearm it.
    pub fn note_change(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms + self.debounce_ms);
    }

    /// Whether a round-trip should start at `now_ms`. False while a call is
    /// outstanding; the armed timer implicitly queues the follow-up.
    pub fn is_due(&self, now_ms: u64) -> bool {
        !self.in_flight && self.deadline.is_some_and(|d| now_ms >= d)
    }

    /// Claim the pending round-trip. Returns true at most once per armed
    /// timer and marks the call in flight.
    pub fn begin(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.deadline = None;
        self.in_flight = true;
        true
    }

    /// The outstanding call finished (successfully or not).
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Disarm the timer; used on session teardown.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Payload for one validation round-trip, claimed from
/// [`EditorSession::tick`](crate::EditorSession::tick).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRequest {
    pub entities: Vec<crate::service::SerializedEntity>,
}

/// Validation result: per entity id, raw error-path strings mapped to
/// message text. Produced by the content service, consumed once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: HashMap<String, HashMap<String, String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(
        &mut self,
        entity_id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.issues
            .entry(entity_id.into())
            .or_default()
            .insert(path.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.issues.values().all(|m| m.is_empty())
    }
}

/// Clear stale markers, then forward each issue for `entity_id` to the slot
/// owning its decoded path. Unresolvable paths are dropped with a warning.
pub(crate) fn route_report(
    report: &ValidationReport,
    entity_id: &str,
    tree: &HandlerTree,
    binding: &mut dyn SlotBinding,
) {
    binding.clear_errors();
    let Some(issues) = report.issues.get(entity_id) else {
        return;
    };
    for (raw, message) in issues {
        let path = AttributePath::decode(raw);
        match tree.resolve(&path) {
            Some(handler) => {
                let index = path.last().map_or(0, |seg| seg.index);
                binding.show_error(handler.path(), index, message);
            }
            None => {
                warn!(path = %raw, entity = %entity_id, "dropping unresolvable validation path");
            }
        }
    }
}
