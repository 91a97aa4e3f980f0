//! The solution-search engine.
//!
//! Turns a stream of increasingly expensive fare groupings into a
//! bounded, diversified flight matrix plus a cheap estimate matrix. The
//! driver owns the loop; admission filtering, cached revalidation, quota
//! tracking, and alternate-date pruning each live in their own module.

mod admission;
mod altdate;
mod config;
mod diag;
mod enumerator;
mod quotas;
mod revalidate;
mod shared;
mod store;

mod driver;
mod orchestrator;


pub use admission::{Admission, AdmissionFilter, FlightChecks, MetadataChecks, RejectReason};
pub use altdate::{AltDatePruner, PruneOutcome, TaxService};
pub use config::{SearchConfig, SearchKind};
pub use diag::{DiagnosticSink, NoopSink, RecordingSink, TraceEvent, TracingSink};
pub use enumerator::CombinationEnumerator;
pub use driver::{
    Deadline, EngineError, FareGroupingSource, NoDeadline, SearchDriver, SearchStats, StopReason,
};
pub use orchestrator::{WorkerOutcome, run_workers, worker_scopes};
pub use quotas::{QuotaReceipt, QuotaTracker};
pub use revalidate::{RevalOutcome, Revalidator, RuleValidator};
pub use shared::{CombinationRegistry, LowestFareBoard, SharedState, WorkerScope};
pub use store::SolutionStore;
