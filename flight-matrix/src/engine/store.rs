//! Solution store: the flight matrix and the estimate matrix.
//!
//! The flight matrix holds fully revalidated, priced solutions keyed by
//! flight combination; the estimate matrix holds cheap neighbor solutions
//! derived from admitted ones. A combination is never in both at once.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::domain::{Estimate, FlightCombination, Itinerary, Solution, Sop};

use super::config::SearchConfig;

/// Flight matrix plus estimate matrix, with family bookkeeping.
#[derive(Debug)]
pub struct SolutionStore {
    /// Admitted solutions. `None` is a flight-only placeholder: the
    /// combination is reserved (e.g., custom-pinned) but has no priced
    /// fare yet.
    flights: HashMap<FlightCombination, Option<Solution>>,

    /// Cheap neighbor solutions, keyed by their own combination.
    estimates: HashMap<FlightCombination, Estimate>,

    /// Estimate combinations grouped under the admitted head combination.
    families: HashMap<FlightCombination, Vec<FlightCombination>>,

    /// Admitted solutions per fare-combination signature.
    signature_counts: HashMap<String, u32>,

    estimate_budget: usize,
    max_repeat: u32,
    min_family_size: usize,
    similarity_pct: u32,
}

impl SolutionStore {
    /// Create an empty store with the configured ceilings.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            flights: HashMap::new(),
            estimates: HashMap::new(),
            families: HashMap::new(),
            signature_counts: HashMap::new(),
            estimate_budget: config.estimated_options,
            max_repeat: config.max_repeat_fare_combinations,
            min_family_size: config.min_family_size,
            similarity_pct: config.travel_time_similarity_pct,
        }
    }

    /// Returns true if a combination already has a solution or estimate.
    ///
    /// A flight-only placeholder does not count: it is a reservation
    /// waiting to be priced, not a finished entry.
    pub fn already_known(&self, combination: &FlightCombination) -> bool {
        self.estimates.contains_key(combination)
            || self
                .flights
                .get(combination)
                .is_some_and(|entry| entry.is_some())
    }

    /// Returns the number of priced solutions in the flight matrix.
    pub fn num_solutions(&self) -> usize {
        self.flights.values().filter(|entry| entry.is_some()).count()
    }

    /// Returns the number of entries in the estimate matrix.
    pub fn num_estimates(&self) -> usize {
        self.estimates.len()
    }

    /// Read-only view of the flight matrix.
    pub fn flights(&self) -> &HashMap<FlightCombination, Option<Solution>> {
        &self.flights
    }

    /// Read-only view of the estimate matrix.
    pub fn estimates(&self) -> &HashMap<FlightCombination, Estimate> {
        &self.estimates
    }

    /// Reserve a combination without a priced fare.
    pub fn insert_placeholder(&mut self, combination: FlightCombination) {
        self.flights.entry(combination).or_insert(None);
    }

    /// Admit a priced solution into the flight matrix.
    ///
    /// Returns false when the configured repeat ceiling for the solution's
    /// fare combination signature is already reached; degenerate
    /// near-duplicate fares would otherwise crowd out diversity.
    pub fn admit(&mut self, solution: Solution) -> bool {
        let signature = solution.grouping().fare_signature();
        let count = self.signature_counts.entry(signature).or_insert(0);
        if *count >= self.max_repeat {
            return false;
        }
        *count += 1;

        let combination = solution.combination().clone();
        self.families.entry(combination.clone()).or_default();
        self.flights.insert(combination, Some(solution));
        true
    }

    /// Replace an admitted solution wholesale.
    ///
    /// Used by the alternate-date repricing pass; a solution is never
    /// mutated in place.
    pub fn replace(&mut self, combination: &FlightCombination, solution: Solution) {
        if let Some(entry) = self.flights.get_mut(combination) {
            *entry = Some(solution);
        }
    }

    /// Remove a combination from the flight matrix.
    ///
    /// Estimate-matrix children derived from it are removed with it.
    /// Returns the removed solution, if one was priced.
    pub fn remove(&mut self, combination: &FlightCombination) -> Option<Solution> {
        let removed = self.flights.remove(combination).flatten();

        if let Some(solution) = &removed {
            if let Some(count) = self
                .signature_counts
                .get_mut(&solution.grouping().fare_signature())
            {
                *count = count.saturating_sub(1);
            }
        }

        if let Some(children) = self.families.remove(combination) {
            for child in children {
                self.estimates.remove(&child);
            }
        }

        removed
    }

    /// Derive cheap neighbor estimates for a freshly admitted solution.
    ///
    /// Neighbors are combinations that swap one or more legs' options for
    /// schedule-similar alternatives: same governing carrier and
    /// connection-point pattern, or elapsed travel time within the
    /// configured similarity percentage. Insertion stops at the estimate
    /// budget.
    ///
    /// Returns the neighbor combinations inserted.
    pub fn find_neighbors(
        &mut self,
        itinerary: &Itinerary,
        solution: &Solution,
    ) -> Vec<FlightCombination> {
        let origin = solution.combination();
        let mut inserted = Vec::new();

        let Ok(chosen) = itinerary.sops_for(origin) else {
            return inserted;
        };

        // Per leg, the options schedule-similar to the chosen one
        let similar_per_leg: Vec<Vec<usize>> = itinerary
            .legs()
            .iter()
            .zip(&chosen)
            .map(|(leg, chosen_sop)| {
                leg.sops()
                    .iter()
                    .enumerate()
                    .filter(|(_, sop)| self.schedule_similar(chosen_sop, sop))
                    .map(|(index, _)| index)
                    .collect()
            })
            .collect();

        let mut cursor = vec![0usize; similar_per_leg.len()];
        'odometer: loop {
            let candidate = FlightCombination::new(
                cursor
                    .iter()
                    .zip(&similar_per_leg)
                    .map(|(&pos, indices)| indices[pos])
                    .collect(),
            );

            if candidate != *origin
                && !self.already_known(&candidate)
                && !self.flights.contains_key(&candidate)
            {
                if self.estimates.len() >= self.estimate_budget {
                    break;
                }
                if let Ok(grouping) = solution.grouping().specialize_for(itinerary, &candidate) {
                    trace!(%candidate, origin = %origin, "estimate neighbor");
                    self.estimates.insert(
                        candidate.clone(),
                        Estimate {
                            origin: origin.clone(),
                            solution: Solution::new(candidate.clone(), grouping),
                        },
                    );
                    self.families
                        .entry(origin.clone())
                        .or_default()
                        .push(candidate.clone());
                    inserted.push(candidate);
                }
            }

            for leg in (0..cursor.len()).rev() {
                cursor[leg] += 1;
                if cursor[leg] < similar_per_leg[leg].len() {
                    continue 'odometer;
                }
                cursor[leg] = 0;
            }
            break;
        }

        inserted
    }

    /// Remove admitted combinations whose estimate family is too small.
    ///
    /// A solution that produced almost no usable neighbors is judged not
    /// worth keeping, unless its combination is protected (custom-pinned
    /// heads are exempt). Returns the removed heads with their solutions
    /// and family sizes.
    pub fn prune_bad_estimate_families(
        &mut self,
        protected: &HashSet<FlightCombination>,
    ) -> Vec<(FlightCombination, Solution, usize)> {
        let doomed: Vec<FlightCombination> = self
            .flights
            .iter()
            .filter(|(combination, entry)| {
                entry.is_some()
                    && !protected.contains(*combination)
                    && self
                        .families
                        .get(*combination)
                        .map_or(0, Vec::len)
                        < self.min_family_size
            })
            .map(|(combination, _)| combination.clone())
            .collect();

        let mut removed = Vec::new();
        for combination in doomed {
            let family_size = self.families.get(&combination).map_or(0, Vec::len);
            if let Some(solution) = self.remove(&combination) {
                removed.push((combination, solution, family_size));
            }
        }
        removed
    }

    /// Collapse schedule-similar admitted solutions into one family.
    ///
    /// When two admitted combinations are near-duplicates of each other's
    /// schedule (discovered via different fare groupings), the cheaper one
    /// wins and the loser migrates into the estimate matrix under the
    /// winner. Returns `(winner, loser)` pairs.
    pub fn merge_families(
        &mut self,
        itinerary: &Itinerary,
    ) -> Vec<(FlightCombination, FlightCombination)> {
        // Cheapest first; ties break on the combination key for stability
        let mut admitted: Vec<(FlightCombination, Solution)> = self
            .flights
            .iter()
            .filter_map(|(combination, entry)| {
                entry.as_ref().map(|s| (combination.clone(), s.clone()))
            })
            .collect();
        admitted.sort_by(|a, b| {
            a.1.total()
                .cmp(&b.1.total())
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut merges = Vec::new();
        let mut absorbed: HashSet<FlightCombination> = HashSet::new();

        for i in 0..admitted.len() {
            let (winner, _) = &admitted[i];
            if absorbed.contains(winner) {
                continue;
            }
            for (loser, loser_solution) in admitted.iter().skip(i + 1) {
                if absorbed.contains(loser) {
                    continue;
                }
                if !self.combinations_similar(itinerary, winner, loser) {
                    continue;
                }

                absorbed.insert(loser.clone());
                let orphans = self.families.remove(loser).unwrap_or_default();
                self.remove_solution_only(loser);

                if self.estimates.len() < self.estimate_budget {
                    self.estimates.insert(
                        loser.clone(),
                        Estimate {
                            origin: winner.clone(),
                            solution: loser_solution.clone(),
                        },
                    );
                    self.families
                        .entry(winner.clone())
                        .or_default()
                        .push(loser.clone());
                }

                // The loser's estimate children follow it into the
                // winner's family
                for orphan in orphans {
                    if let Some(estimate) = self.estimates.get_mut(&orphan) {
                        estimate.origin = winner.clone();
                    }
                    self.families
                        .entry(winner.clone())
                        .or_default()
                        .push(orphan);
                }

                merges.push((winner.clone(), loser.clone()));
            }
        }

        merges
    }

    /// Admitted solutions in ascending tax-adjusted price order.
    ///
    /// Ties preserve combination order, so the view is stable across
    /// calls.
    pub fn sorted_solutions(&self) -> Vec<&Solution> {
        let mut solutions: Vec<&Solution> =
            self.flights.values().filter_map(Option::as_ref).collect();
        solutions.sort_by(|a, b| {
            a.total()
                .cmp(&b.total())
                .then_with(|| a.combination().cmp(b.combination()))
        });
        solutions
    }

    /// Remove a flight-matrix entry without touching its family.
    fn remove_solution_only(&mut self, combination: &FlightCombination) {
        if let Some(Some(solution)) = self.flights.remove(combination) {
            if let Some(count) = self
                .signature_counts
                .get_mut(&solution.grouping().fare_signature())
            {
                *count = count.saturating_sub(1);
            }
        }
    }

    fn schedule_similar(&self, a: &Sop, b: &Sop) -> bool {
        if a.governing_carrier() == b.governing_carrier()
            && a.connection_pattern() == b.connection_pattern()
        {
            return true;
        }
        let (shorter, longer) = {
            let ta = a.travel_time().num_minutes().max(1);
            let tb = b.travel_time().num_minutes().max(1);
            (ta.min(tb), ta.max(tb))
        };
        shorter * 100 >= longer * i64::from(self.similarity_pct)
    }

    fn combinations_similar(
        &self,
        itinerary: &Itinerary,
        a: &FlightCombination,
        b: &FlightCombination,
    ) -> bool {
        let (Ok(sops_a), Ok(sops_b)) = (itinerary.sops_for(a), itinerary.sops_for(b)) else {
            return false;
        };
        sops_a
            .iter()
            .zip(&sops_b)
            .all(|(sa, sb)| self.schedule_similar(sa, sb))
    }
}
