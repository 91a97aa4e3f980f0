//! Diagnostic sink for structured trace events.
//!
//! The search loop reports what it evaluates, admits, and rejects through
//! a sink passed in at driver construction. Events are observational only
//! and never affect control flow. Production hot paths use `NoopSink`;
//! the report formatter consumes serialized events from a real sink.

use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::Serialize;

use super::admission::RejectReason;
use super::driver::StopReason;
use crate::domain::FlightCombination;

/// A structured trace event from the search loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A fare grouping was pulled from the source.
    GroupingPulled {
        /// 1-based ordinal of the grouping within this worker's stream.
        ordinal: u64,
        /// The grouping's total price.
        total: Decimal,
    },

    /// A candidate combination was rejected before revalidation.
    CombinationRejected {
        combination: FlightCombination,
        reason: RejectReason,
    },

    /// A fare path was revalidated for a combination.
    FarePathRevalidated {
        combination: FlightCombination,
        /// True when the result came from the cache.
        cached: bool,
        passed: bool,
    },

    /// A solution entered the flight matrix.
    SolutionAdmitted {
        combination: FlightCombination,
        total: Decimal,
    },

    /// A neighbor estimate entered the estimate matrix.
    EstimateAdded {
        combination: FlightCombination,
        origin: FlightCombination,
    },

    /// An admitted combination was pruned for having too small a family.
    FamilyPruned {
        head: FlightCombination,
        family_size: usize,
    },

    /// Two schedule-similar admitted combinations were merged.
    FamiliesMerged {
        winner: FlightCombination,
        loser: FlightCombination,
    },

    /// The alternate-date pruner removed a solution.
    SolutionPruned {
        combination: FlightCombination,
        date_pair: String,
        total: Decimal,
    },

    /// The search loop stopped.
    SearchEnded { reason: StopReason, admitted: usize },
}

/// Receives trace events from the search loop.
///
/// Implementations must be cheap: the sink is called from the hot loop.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: TraceEvent);
}

/// Sink that discards every event; the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _event: TraceEvent) {}
}

/// Sink that logs events through `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: TraceEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::debug!(target: "flight_matrix::trace", "{json}"),
            Err(err) => tracing::warn!("unserializable trace event: {err}"),
        }
    }
}

/// Sink that collects events in memory, for tests and report assembly.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: TraceEvent) {
        self.events.lock().expect("sink poisoned").push(event);
    }
}
