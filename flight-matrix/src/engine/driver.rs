//! The search driver: the main solution-search loop.
//!
//! Pulls fare groupings in non-decreasing price order, enumerates the
//! compatible flight combinations, filters them cheaply, revalidates the
//! survivors, and admits solutions until every quota bucket is satisfied
//! or a budget runs out. Exhaustion, budget truncation, and cooperative
//! cancellation are normal terminations that yield partial results;
//! broken upstream contracts are deferred until the loop exits and then
//! surfaced to the caller.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    DomainError, FareGrouping, FlightCombination, Itinerary, Solution,
};

use super::admission::{Admission, AdmissionFilter, FlightChecks, RejectReason};
use super::altdate::{AltDatePruner, PruneOutcome, TaxService};
use super::config::{SearchConfig, SearchKind};
use super::diag::{DiagnosticSink, TraceEvent};
use super::enumerator::CombinationEnumerator;
use super::quotas::QuotaTracker;
use super::revalidate::{Revalidator, RuleValidator};
use super::shared::{SharedState, WorkerScope};
use super::store::SolutionStore;

/// Errors the engine surfaces to its caller.
///
/// Everything here indicates a bug in an upstream collaborator's
/// contract; ordinary terminations (exhaustion, budgets, cancellation)
/// are reported through [`StopReason`] instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The fare grouping source produced a cheaper grouping after a more
    /// expensive one.
    #[error("fare grouping source violated price ordering: {previous} then {current}")]
    PriceRegression {
        previous: Decimal,
        current: Decimal,
    },

    /// A combination or grouping does not fit the itinerary.
    #[error("upstream contract violation: {0}")]
    Contract(#[from] DomainError),

    /// A worker task died without producing a result.
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The fare grouping source has nothing more to offer.
    Exhausted,

    /// Every required quota bucket is satisfied.
    EnoughOptions,

    /// A combination or fare-path try-count ceiling was reached.
    BudgetExhausted,

    /// The transaction was aborted or its deadline expired.
    Aborted,

    /// An internal error stopped the loop; it is re-raised after
    /// finalization.
    Failed,
}

/// Counters describing one worker's search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Fare groupings pulled from the source.
    pub groupings_pulled: u64,

    /// Candidate combinations evaluated.
    pub combinations_evaluated: u64,

    /// Solutions admitted into the flight matrix.
    pub combinations_admitted: u64,

    /// Candidates rejected by the admission filter or revalidation.
    pub combinations_rejected: u64,

    /// Fare-path revalidations performed (cached or not).
    pub fare_paths_validated: u64,

    /// Why the loop stopped.
    pub stop_reason: StopReason,
}

/// On-demand supplier of priced fare groupings.
///
/// Implementations must yield groupings in non-decreasing total price
/// order; the driver treats a price regression as a contract violation.
pub trait FareGroupingSource: Send {
    /// The next-cheapest grouping, or `None` when exhausted.
    fn next_grouping(&mut self) -> Option<FareGrouping>;
}

/// Transaction-wide deadline policy, polled cooperatively.
pub trait Deadline: Send + Sync {
    /// True when remaining time is short and budgets should tighten.
    fn must_hurry(&self) -> bool;

    /// True when the transaction is aborted; the loop exits immediately.
    fn is_aborted(&self) -> bool;
}

/// A deadline that never fires; useful for tests and offline runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeadline;

impl Deadline for NoDeadline {
    fn must_hurry(&self) -> bool {
        false
    }

    fn is_aborted(&self) -> bool {
        false
    }
}

/// One worker's search loop and the state it owns.
///
/// The driver exclusively owns its solution store and quota tracker;
/// other workers only ever read its published combinations through the
/// shared registry.
pub struct SearchDriver<S, V, C, D> {
    itinerary: Arc<Itinerary>,
    config: Arc<SearchConfig>,
    scope: WorkerScope,
    kind: SearchKind,
    source: S,
    revalidator: Revalidator<V>,
    checks: C,
    deadline: D,
    diag: Arc<dyn DiagnosticSink>,
    shared: Arc<SharedState>,

    store: SolutionStore,
    quotas: QuotaTracker,
    custom: HashSet<FlightCombination>,
    tried: HashSet<FlightCombination>,

    target: usize,
    combinations_without_success: u32,
    fare_paths_tried: u32,
    iterations: u64,
    hurry: bool,
    last_price: Option<Decimal>,
    stats: SearchStats,
}

impl<S, V, C, D> SearchDriver<S, V, C, D>
where
    S: FareGroupingSource,
    V: RuleValidator,
    C: FlightChecks,
    D: Deadline,
{
    /// Assemble a worker.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        itinerary: Arc<Itinerary>,
        config: Arc<SearchConfig>,
        scope: WorkerScope,
        kind: SearchKind,
        source: S,
        validator: V,
        checks: C,
        deadline: D,
        diag: Arc<dyn DiagnosticSink>,
        shared: Arc<SharedState>,
    ) -> Self {
        let store = SolutionStore::new(&config);
        let revalidator = Revalidator::new(validator, config.revalidation_cache_size);
        Self {
            itinerary,
            config,
            scope,
            kind,
            source,
            revalidator,
            checks,
            deadline,
            diag,
            shared,
            store,
            quotas: QuotaTracker::new(),
            custom: HashSet::new(),
            tried: HashSet::new(),
            target: 0,
            combinations_without_success: 0,
            fare_paths_tried: 0,
            iterations: 0,
            hurry: false,
            last_price: None,
            stats: SearchStats {
                groupings_pulled: 0,
                combinations_evaluated: 0,
                combinations_admitted: 0,
                combinations_rejected: 0,
                fare_paths_validated: 0,
                stop_reason: StopReason::Exhausted,
            },
        }
    }

    /// Pin requester-supplied custom combinations.
    ///
    /// Each pinned combination is reserved in the flight matrix as a
    /// flight-only placeholder until a priced fare is found for it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a pinned combination does not fit the itinerary.
    pub fn with_custom_combinations(
        mut self,
        combinations: impl IntoIterator<Item = FlightCombination>,
    ) -> Result<Self, EngineError> {
        for combination in combinations {
            self.itinerary.sops_for(&combination)?;
            self.store.insert_placeholder(combination.clone());
            self.custom.insert(combination);
        }
        Ok(self)
    }

    /// Run the search until `options_requested` solutions exist or a
    /// terminal condition is reached.
    ///
    /// Partial results are valid for every terminal condition except a
    /// contract violation, and even then the matrices built so far remain
    /// readable; the error is deferred until partial results are
    /// finalized.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for upstream contract violations.
    pub fn run(&mut self, options_requested: usize) -> Result<SearchStats, EngineError> {
        self.target = self.target.max(options_requested);

        let (reason, deferred) = self.search_loop();
        self.finalize();

        self.stats.stop_reason = reason;
        self.diag.record(TraceEvent::SearchEnded {
            reason,
            admitted: self.store.num_solutions(),
        });
        debug!(scope = %self.scope, ?reason, admitted = self.store.num_solutions(), "search ended");

        match deferred {
            Some(error) => Err(error),
            None => Ok(self.stats),
        }
    }

    /// Resume the loop with a higher option target.
    ///
    /// Prior state is kept: combinations already tried are not re-tried
    /// and admitted solutions stay admitted.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for upstream contract violations.
    pub fn get_additional_solutions(&mut self, n: usize) -> Result<SearchStats, EngineError> {
        let target = self.target + n;
        self.run(target)
    }

    /// Run the alternate-date repricing and pruning pass.
    ///
    /// Call after every cooperating worker has finished its search, so
    /// the shared lowest-fare board holds the true per-date-pair lows.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for upstream contract violations.
    pub fn prune_alternate_dates<T: TaxService>(
        &mut self,
        taxes: &T,
    ) -> Result<PruneOutcome, EngineError> {
        let pruner = AltDatePruner::new(
            &self.itinerary,
            &self.config,
            taxes,
            &self.shared.fares,
            self.diag.as_ref(),
        );
        Ok(pruner.prune(&mut self.store, &mut self.quotas)?)
    }

    /// Returns the scope this worker covers.
    pub fn scope(&self) -> WorkerScope {
        self.scope
    }

    /// True when this worker searches an alternate-date itinerary.
    pub fn alternate_dates(&self) -> bool {
        self.itinerary.alternate_dates()
    }

    /// Read-only view of the flight matrix.
    pub fn solutions(&self) -> &std::collections::HashMap<FlightCombination, Option<Solution>> {
        self.store.flights()
    }

    /// Read-only view of the estimate matrix.
    pub fn estimates(&self) -> &std::collections::HashMap<FlightCombination, crate::domain::Estimate> {
        self.store.estimates()
    }

    /// Admitted solutions in ascending tax-adjusted price order.
    pub fn sorted_solutions(&self) -> Vec<&Solution> {
        self.store.sorted_solutions()
    }

    /// Counters for this worker so far.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Consume the driver, yielding its matrices.
    pub fn into_matrices(
        self,
    ) -> (
        std::collections::HashMap<FlightCombination, Option<Solution>>,
        std::collections::HashMap<FlightCombination, crate::domain::Estimate>,
    ) {
        let SearchDriver { store, .. } = self;
        let flights = store.flights().clone();
        let estimates = store.estimates().clone();
        (flights, estimates)
    }

    /// The main loop. Returns the stop reason and any deferred error.
    fn search_loop(&mut self) -> (StopReason, Option<EngineError>) {
        loop {
            // Suspension point: budgets and cancellation, checked between
            // groupings
            self.hurry = self.deadline.must_hurry();
            if self.deadline.is_aborted() {
                return (StopReason::Aborted, None);
            }
            if self.budgets_exhausted() {
                return (StopReason::BudgetExhausted, None);
            }
            if self.enough_solutions() {
                return (StopReason::EnoughOptions, None);
            }

            let Some(grouping) = self.source.next_grouping() else {
                return (StopReason::Exhausted, None);
            };
            self.stats.groupings_pulled += 1;

            let total = grouping.total_price();
            if let Some(previous) = self.last_price {
                if total < previous {
                    return (
                        StopReason::Failed,
                        Some(EngineError::PriceRegression {
                            previous,
                            current: total,
                        }),
                    );
                }
            }
            self.last_price = Some(total);
            self.diag.record(TraceEvent::GroupingPulled {
                ordinal: self.stats.groupings_pulled,
                total,
            });

            let enumerator = match CombinationEnumerator::new(&self.itinerary, &grouping) {
                Ok(enumerator) => enumerator,
                Err(error) => return (StopReason::Failed, Some(error.into())),
            };

            let mut fresh_combinations = 0u32;
            for combination in enumerator {
                if self.tried.contains(&combination) {
                    continue;
                }
                fresh_combinations += 1;

                // Suspension point: poll the deadline at fixed intervals,
                // not every iteration
                self.iterations += 1;
                if self.iterations % self.config.deadline_poll_interval == 0 {
                    self.hurry = self.deadline.must_hurry();
                    if self.deadline.is_aborted() {
                        return (StopReason::Aborted, None);
                    }
                }

                if let Err(error) = self.try_combination(combination, &grouping) {
                    return (StopReason::Failed, Some(error));
                }

                if self.budgets_exhausted() {
                    return (StopReason::BudgetExhausted, None);
                }
                if self.enough_solutions() {
                    return (StopReason::EnoughOptions, None);
                }
            }

            // A grouping whose combinations were all tried before makes
            // no progress; it still consumes budget so a source that
            // repeats itself forever cannot spin the loop
            if fresh_combinations == 0 {
                self.combinations_without_success += 1;
            }
        }
    }

    /// Process one candidate combination. All-or-nothing: on error the
    /// store and quotas are exactly as they were before the call.
    fn try_combination(
        &mut self,
        combination: FlightCombination,
        template: &FareGrouping,
    ) -> Result<(), EngineError> {
        self.tried.insert(combination.clone());
        self.stats.combinations_evaluated += 1;

        let verdict = {
            let filter = AdmissionFilter {
                itinerary: &self.itinerary,
                config: &self.config,
                scope: self.scope,
                kind: self.kind,
                store: &self.store,
                quotas: &self.quotas,
                registry: &self.shared.registry,
                checks: &self.checks,
                custom: &self.custom,
            };
            filter.check(&combination)?
        };
        if let Admission::Reject(reason) = verdict {
            self.reject(combination, reason);
            return Ok(());
        }

        self.fare_paths_tried += 1;
        self.stats.fare_paths_validated += 1;
        let outcome = self
            .revalidator
            .validate(&self.itinerary, &combination, template)?;
        self.diag.record(TraceEvent::FarePathRevalidated {
            combination: combination.clone(),
            cached: outcome.cached,
            passed: outcome.passed,
        });
        if !outcome.passed {
            self.combinations_without_success += 1;
            self.stats.combinations_rejected += 1;
            return Ok(());
        }

        // Duplicate the grouping for this specific combination; the
        // shared template is never mutated
        let specialized = template.specialize_for(&self.itinerary, &combination)?;
        let solution = Solution::new(combination.clone(), specialized);

        let carriers = self.itinerary.governing_carriers(&combination)?;
        let date_pair = if self.itinerary.alternate_dates() {
            Some(self.itinerary.date_pair(&combination)?)
        } else {
            None
        };
        let long_connection = self.itinerary.has_long_connection(&combination)?;
        let is_custom = self.custom.contains(&combination);

        // Speculative quota consumption, rolled back if the store refuses
        let receipt = self
            .quotas
            .record(&carriers, date_pair, long_connection, is_custom);
        if !self.store.admit(solution.clone()) {
            self.quotas.rollback(receipt);
            self.reject(combination, RejectReason::RepeatFareCeiling);
            return Ok(());
        }

        self.shared
            .registry
            .publish(self.scope, combination.clone());
        if let Some(dp) = date_pair {
            let snowman = self.itinerary.is_snowman(&combination)?;
            self.shared.fares.offer(dp, solution.total(), snowman);
        }

        for neighbor in self.store.find_neighbors(&self.itinerary, &solution) {
            self.diag.record(TraceEvent::EstimateAdded {
                combination: neighbor,
                origin: combination.clone(),
            });
        }

        self.stats.combinations_admitted += 1;
        self.diag.record(TraceEvent::SolutionAdmitted {
            combination,
            total: solution.total(),
        });

        Ok(())
    }

    fn reject(&mut self, combination: FlightCombination, reason: RejectReason) {
        self.combinations_without_success += 1;
        self.stats.combinations_rejected += 1;
        self.diag.record(TraceEvent::CombinationRejected {
            combination,
            reason,
        });
    }

    fn budgets_exhausted(&self) -> bool {
        self.combinations_without_success >= self.config.combination_ceiling(self.kind, self.hurry)
            || self.fare_paths_tried >= self.config.fare_path_ceiling(self.hurry)
    }

    fn enough_solutions(&self) -> bool {
        if self.kind == SearchKind::Custom {
            return self.quotas.custom_satisfied(&self.config);
        }
        if self.store.num_solutions() < self.target {
            return false;
        }
        if self.itinerary.alternate_dates() {
            return self
                .itinerary
                .date_pairs()
                .iter()
                .all(|dp| self.quotas.date_pair_served(*dp, &self.config));
        }
        true
    }

    /// Post-loop cleanup: families too small to keep are pruned and
    /// schedule-similar admitted duplicates are merged.
    fn finalize(&mut self) {
        for (head, _solution, family_size) in
            self.store.prune_bad_estimate_families(&self.custom)
        {
            if let (Ok(date_pair), Ok(long_connection)) = (
                self.itinerary.date_pair(&head),
                self.itinerary.has_long_connection(&head),
            ) {
                let dp = self.itinerary.alternate_dates().then_some(date_pair);
                self.quotas.release_solution(dp, long_connection, false);
            }
            self.diag.record(TraceEvent::FamilyPruned {
                head,
                family_size,
            });
        }

        for (winner, loser) in self.store.merge_families(&self.itinerary) {
            if let (Ok(date_pair), Ok(long_connection)) = (
                self.itinerary.date_pair(&loser),
                self.itinerary.has_long_connection(&loser),
            ) {
                let dp = self.itinerary.alternate_dates().then_some(date_pair);
                self.quotas.release_solution(dp, long_connection, false);
            }
            self.diag
                .record(TraceEvent::FamiliesMerged { winner, loser });
        }
    }
}
