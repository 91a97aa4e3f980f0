//! Alternate-date tax-adjusted pruning.
//!
//! Runs after the search has produced a full alternate-date flight matrix.
//! Every solution is repriced with a freshly computed tax and surcharge,
//! then each date pair keeps its cheapest solution, its first K solutions
//! within the price-jump band, and any further solution that introduces a
//! new carrier (or carrier pair) for that date pair. Everything else is
//! removed, and the removal is reflected in per-date-pair bookkeeping.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{
    CarrierCode, DatePair, DomainError, FareGrouping, FlightCombination, Itinerary, Solution,
};

use super::config::SearchConfig;
use super::diag::{DiagnosticSink, TraceEvent};
use super::quotas::QuotaTracker;
use super::shared::LowestFareBoard;
use super::store::SolutionStore;

/// External tax-computation subsystem.
pub trait TaxService: Send + Sync {
    /// Compute the tax amount for a solution.
    fn compute_tax(&self, solution: &Solution) -> Decimal;

    /// Compute the surcharge amount for a solution.
    fn compute_surcharges(&self, solution: &Solution) -> Decimal;

    /// Re-validate the category rules affected by stripping the tax.
    fn validate_tax_stripped(
        &self,
        grouping: &FareGrouping,
        combination: &FlightCombination,
    ) -> bool;
}

/// What one pruning pass did.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Solutions repriced with a recomputed tax.
    pub repriced: usize,

    /// Combinations removed from the flight matrix.
    pub removed: Vec<FlightCombination>,
}

/// The alternate-date pruner.
pub struct AltDatePruner<'a, T> {
    itinerary: &'a Itinerary,
    config: &'a SearchConfig,
    taxes: &'a T,
    board: &'a LowestFareBoard,
    diag: &'a dyn DiagnosticSink,
}

impl<'a, T: TaxService> AltDatePruner<'a, T> {
    /// Assemble a pruner over the shared lowest-fare board.
    pub fn new(
        itinerary: &'a Itinerary,
        config: &'a SearchConfig,
        taxes: &'a T,
        board: &'a LowestFareBoard,
        diag: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            itinerary,
            config,
            taxes,
            board,
            diag,
        }
    }

    /// Reprice and prune one worker's flight matrix.
    ///
    /// Removal is all-or-nothing per solution: the store entry, the family
    /// bookkeeping, and the quota counts move together.
    ///
    /// # Errors
    ///
    /// Returns `Err` when a stored combination no longer fits the
    /// itinerary, which indicates a broken upstream contract.
    pub fn prune(
        &self,
        store: &mut SolutionStore,
        quotas: &mut QuotaTracker,
    ) -> Result<PruneOutcome, DomainError> {
        let mut outcome = PruneOutcome::default();

        // Cheapest first, so the first solution seen for a date pair is
        // its cheapest representative
        let solutions: Vec<Solution> = store
            .sorted_solutions()
            .into_iter()
            .cloned()
            .collect();

        // Tax is computed once per date pair, on the cheapest
        // representative, and reused for the rest of the pair
        let mut tax_memo: HashMap<DatePair, Decimal> = HashMap::new();
        let mut repriced: Vec<(DatePair, bool, Solution)> = Vec::new();
        let mut failed_strip: Vec<FlightCombination> = Vec::new();

        for solution in solutions {
            let combination = solution.combination().clone();
            let date_pair = self.itinerary.date_pair(&combination)?;
            let snowman = self.itinerary.is_snowman(&combination)?;

            let stripped = solution.grouping().stripped_of_tax();
            if !self.taxes.validate_tax_stripped(&stripped, &combination) {
                failed_strip.push(combination);
                continue;
            }

            let tax = *tax_memo
                .entry(date_pair)
                .or_insert_with(|| self.taxes.compute_tax(&solution));
            let surcharges = self.taxes.compute_surcharges(&solution);

            let replacement =
                solution.repriced(stripped.with_tax(tax).with_surcharges(surcharges));
            self.board.offer(date_pair, replacement.total(), snowman);
            store.replace(&combination, replacement.clone());
            outcome.repriced += 1;

            repriced.push((date_pair, snowman, replacement));
        }

        for combination in failed_strip {
            self.remove(store, quotas, &combination, &mut outcome)?;
        }

        // Keep policy per date pair, cheapest first within each pair
        repriced.sort_by(|a, b| {
            a.2.total()
                .cmp(&b.2.total())
                .then_with(|| a.2.combination().cmp(b.2.combination()))
        });

        let mut kept_per_pair: HashMap<DatePair, u32> = HashMap::new();
        let mut carriers_per_pair: HashMap<DatePair, HashSet<Vec<CarrierCode>>> = HashMap::new();

        for (date_pair, snowman, solution) in repriced {
            let rank = kept_per_pair.get(&date_pair).copied().unwrap_or(0);

            if rank == 0 {
                // The cheapest solution of a date pair is always kept
                self.note_kept(
                    &mut kept_per_pair,
                    &mut carriers_per_pair,
                    date_pair,
                    &solution,
                )?;
                continue;
            }

            if self.is_price_outlier(date_pair, snowman, solution.total()) {
                self.remove(store, quotas, solution.combination(), &mut outcome)?;
                continue;
            }

            let carrier_key = self.itinerary.governing_carriers(solution.combination())?;
            let new_carriers = !carriers_per_pair
                .get(&date_pair)
                .is_some_and(|seen| seen.contains(&carrier_key));

            if rank < self.config.solutions_per_date_pair || new_carriers {
                self.note_kept(
                    &mut kept_per_pair,
                    &mut carriers_per_pair,
                    date_pair,
                    &solution,
                )?;
            } else {
                self.remove(store, quotas, solution.combination(), &mut outcome)?;
            }
        }

        debug!(
            repriced = outcome.repriced,
            removed = outcome.removed.len(),
            "alternate-date pruning finished"
        );

        Ok(outcome)
    }

    fn note_kept(
        &self,
        kept: &mut HashMap<DatePair, u32>,
        carriers: &mut HashMap<DatePair, HashSet<Vec<CarrierCode>>>,
        date_pair: DatePair,
        solution: &Solution,
    ) -> Result<(), DomainError> {
        *kept.entry(date_pair).or_insert(0) += 1;
        carriers
            .entry(date_pair)
            .or_default()
            .insert(self.itinerary.governing_carriers(solution.combination())?);
        Ok(())
    }

    /// A solution is an outlier when it costs more than the date pair's
    /// cheapest total times the price-jump factor. Snowman combinations
    /// are compared against the snowman record and factor.
    fn is_price_outlier(&self, date_pair: DatePair, snowman: bool, total: Decimal) -> bool {
        let (lowest, factor) = if snowman {
            (
                self.board
                    .lowest_snowman(date_pair)
                    .or_else(|| self.board.lowest(date_pair)),
                self.config.snowman_price_jump_factor,
            )
        } else {
            (self.board.lowest(date_pair), self.config.price_jump_factor)
        };
        match lowest {
            Some(lowest) => total > lowest * factor,
            None => false,
        }
    }

    fn remove(
        &self,
        store: &mut SolutionStore,
        quotas: &mut QuotaTracker,
        combination: &FlightCombination,
        outcome: &mut PruneOutcome,
    ) -> Result<(), DomainError> {
        let date_pair = self.itinerary.date_pair(combination)?;
        let long_connection = self.itinerary.has_long_connection(combination)?;

        if let Some(solution) = store.remove(combination) {
            quotas.release_solution(Some(date_pair), long_connection, false);
            self.diag.record(TraceEvent::SolutionPruned {
                combination: combination.clone(),
                date_pair: date_pair.to_string(),
                total: solution.total(),
            });
            outcome.removed.push(combination.clone());
        }

        Ok(())
    }
}
