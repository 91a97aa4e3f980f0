//! Cross-worker shared state.
//!
//! Workers own their solution stores exclusively; only two pieces of state
//! cross ownership boundaries. The combination registry lets a worker see
//! what the companion scope has already published, so the same combination
//! is never produced twice. The lowest-fare board keeps the per-date-pair
//! cheapest totals the alternate-date pruner compares against. Both are
//! designed for concurrent readers with short, single read-modify-write
//! critical sections.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, RwLock};

use rust_decimal::Decimal;

use crate::domain::{CarrierCode, DatePair, FlightCombination};

/// What slice of the combination space a worker covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerScope {
    /// Combinations governed end-to-end by one carrier.
    Online(CarrierCode),

    /// Combinations spanning more than one governing carrier.
    Interline,
}

impl fmt::Display for WorkerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerScope::Online(carrier) => write!(f, "online:{carrier}"),
            WorkerScope::Interline => f.write_str("interline"),
        }
    }
}

/// Combinations each worker has admitted, readable by every other worker.
///
/// Writers only ever add entries, so a reader racing a writer sees either
/// the combination or a not-yet state, both of which are safe: a missed
/// read means at most one redundant revalidation, never a lost solution.
#[derive(Debug, Default)]
pub struct CombinationRegistry {
    published: RwLock<HashMap<WorkerScope, HashSet<FlightCombination>>>,
}

impl CombinationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a combination admitted by a worker.
    pub fn publish(&self, scope: WorkerScope, combination: FlightCombination) {
        self.published
            .write()
            .expect("registry poisoned")
            .entry(scope)
            .or_default()
            .insert(combination);
    }

    /// Returns true if any other worker has published this combination.
    pub fn published_elsewhere(&self, own: WorkerScope, combination: &FlightCombination) -> bool {
        self.published
            .read()
            .expect("registry poisoned")
            .iter()
            .any(|(scope, combos)| *scope != own && combos.contains(combination))
    }

    /// Returns how many combinations a scope has published.
    pub fn published_count(&self, scope: WorkerScope) -> usize {
        self.published
            .read()
            .expect("registry poisoned")
            .get(&scope)
            .map_or(0, HashSet::len)
    }
}

/// Per-date-pair lowest prices, normal and mirror ("snowman") variants.
#[derive(Debug, Clone, Copy, Default)]
struct FareRecord {
    normal: Option<Decimal>,
    snowman: Option<Decimal>,
}

/// Shared lowest tax-adjusted totals per date pair.
///
/// Updates use compare-and-set semantics: only a lower value replaces the
/// stored one, so updates commute regardless of worker arrival order. The
/// lock covers exactly one read-modify-write.
#[derive(Debug, Default)]
pub struct LowestFareBoard {
    records: Mutex<HashMap<DatePair, FareRecord>>,
}

impl LowestFareBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a total for a date pair; lower values win.
    ///
    /// Returns true if the offer became the new lowest for its variant.
    pub fn offer(&self, date_pair: DatePair, total: Decimal, snowman: bool) -> bool {
        let mut records = self.records.lock().expect("fare board poisoned");
        let record = records.entry(date_pair).or_default();
        let slot = if snowman {
            &mut record.snowman
        } else {
            &mut record.normal
        };
        match slot {
            Some(current) if *current <= total => false,
            _ => {
                *slot = Some(total);
                true
            }
        }
    }

    /// Returns the lowest normal total recorded for a date pair.
    pub fn lowest(&self, date_pair: DatePair) -> Option<Decimal> {
        self.records
            .lock()
            .expect("fare board poisoned")
            .get(&date_pair)
            .and_then(|record| record.normal)
    }

    /// Returns the lowest snowman total recorded for a date pair.
    pub fn lowest_snowman(&self, date_pair: DatePair) -> Option<Decimal> {
        self.records
            .lock()
            .expect("fare board poisoned")
            .get(&date_pair)
            .and_then(|record| record.snowman)
    }
}

/// The shared state a set of cooperating workers hangs off one `Arc`.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Cross-worker duplicate suppression.
    pub registry: CombinationRegistry,

    /// Per-date-pair lowest-price records.
    pub fares: LowestFareBoard,
}

impl SharedState {
    /// Create empty shared state.
    pub fn new() -> Self {
        Self::default()
    }
}
