//! Solution types.

use rust_decimal::Decimal;

use super::{FareGrouping, FlightCombination};

/// A flight combination paired with its priced, combination-specific fare
/// grouping.
///
/// Created when a combination passes admission and revalidation; owned by
/// the solution store afterwards. A solution is never mutated in place: a
/// cheaper or better family representative replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    combination: FlightCombination,
    grouping: FareGrouping,
    total: Decimal,
}

impl Solution {
    /// Pair a combination with its specialized grouping.
    ///
    /// The total is the grouping's tax-adjusted total at construction time.
    pub fn new(combination: FlightCombination, grouping: FareGrouping) -> Self {
        let total = grouping.total_price();
        Self {
            combination,
            grouping,
            total,
        }
    }

    /// Returns the flight combination.
    pub fn combination(&self) -> &FlightCombination {
        &self.combination
    }

    /// Returns the combination-specific fare grouping.
    pub fn grouping(&self) -> &FareGrouping {
        &self.grouping
    }

    /// Returns the tax-adjusted total price.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Build a replacement solution with a repriced grouping.
    pub fn repriced(&self, grouping: FareGrouping) -> Self {
        Self::new(self.combination.clone(), grouping)
    }
}

/// A cheap neighbor of an admitted solution.
///
/// Estimates are not independently revalidated to the same rigor as flight
/// matrix entries; they exist to make the response feel richer without
/// paying full pricing cost.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// The admitted combination this estimate was derived from.
    pub origin: FlightCombination,

    /// The estimated solution for the neighbor combination.
    pub solution: Solution,
}
