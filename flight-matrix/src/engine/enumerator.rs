//! Lazy flight combination enumeration.
//!
//! Given a fare grouping, produce the flight combinations compatible with
//! its per-leg requirements, one at a time. The full cartesian product is
//! never materialized: the driver pulls combinations lazily and skips the
//! ones it has already tried.

use crate::domain::{DomainError, FareGrouping, FlightCombination, Itinerary};

/// Odometer-style iterator over compatible flight combinations.
///
/// The rightmost leg advances fastest, so enumeration order is stable for
/// a given itinerary and grouping.
#[derive(Debug)]
pub struct CombinationEnumerator {
    /// Admissible scheduling option indices per leg.
    candidates: Vec<Vec<usize>>,

    /// Current position into each leg's candidate list.
    cursor: Vec<usize>,

    exhausted: bool,
}

impl CombinationEnumerator {
    /// Build an enumerator for the combinations compatible with a grouping.
    ///
    /// A leg with no admissible option makes the enumeration empty, not an
    /// error; fare groupings routinely require carriers a leg cannot offer.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the grouping's requirement list does not match the
    /// itinerary's leg count.
    pub fn new(itinerary: &Itinerary, grouping: &FareGrouping) -> Result<Self, DomainError> {
        let requirements = grouping.leg_requirements();
        if requirements.len() != itinerary.num_legs() {
            return Err(DomainError::RequirementCountMismatch {
                expected: itinerary.num_legs(),
                got: requirements.len(),
            });
        }

        let candidates: Vec<Vec<usize>> = itinerary
            .legs()
            .iter()
            .zip(requirements)
            .map(|(leg, requirement)| {
                leg.sops()
                    .iter()
                    .enumerate()
                    .filter(|(_, sop)| requirement.allows(sop))
                    .map(|(index, _)| index)
                    .collect()
            })
            .collect();

        let exhausted = candidates.iter().any(Vec::is_empty);
        let cursor = vec![0; candidates.len()];

        Ok(Self {
            candidates,
            cursor,
            exhausted,
        })
    }

    /// Returns how many combinations this enumeration can produce in total.
    pub fn combination_count(&self) -> usize {
        self.candidates.iter().map(Vec::len).product()
    }

    fn advance(&mut self) {
        // Rightmost leg first, carrying leftwards like an odometer
        for leg in (0..self.cursor.len()).rev() {
            self.cursor[leg] += 1;
            if self.cursor[leg] < self.candidates[leg].len() {
                return;
            }
            self.cursor[leg] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for CombinationEnumerator {
    type Item = FlightCombination;

    fn next(&mut self) -> Option<FlightCombination> {
        if self.exhausted {
            return None;
        }

        let combination = FlightCombination::new(
            self.cursor
                .iter()
                .zip(&self.candidates)
                .map(|(&pos, leg_candidates)| leg_candidates[pos])
                .collect(),
        );

        self.advance();
        Some(combination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AirportCode, CarrierCode, FareUsage, Leg, LegRequirement, PaxFare, PaxTypeCode,
        PricingUnit, Sop, TravelSegment,
    };
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn carrier(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn nonstop(cx: &str, from: &str, to: &str, day: u32, dep: u32) -> Arc<Sop> {
        let seg = TravelSegment::new(
            carrier(cx),
            100,
            AirportCode::parse(from).unwrap(),
            AirportCode::parse(to).unwrap(),
            dt(day, dep),
            dt(day, dep + 3),
        );
        Arc::new(Sop::new(carrier(cx), vec![seg]).unwrap())
    }

    fn itinerary() -> Itinerary {
        Itinerary::new(vec![
            Leg::new(vec![
                nonstop("AA", "JFK", "LAX", 1, 8),
                nonstop("BA", "JFK", "LAX", 1, 10),
                nonstop("AA", "JFK", "LAX", 1, 12),
            ])
            .unwrap(),
            Leg::new(vec![
                nonstop("AA", "LAX", "JFK", 8, 9),
                nonstop("BA", "LAX", "JFK", 8, 11),
            ])
            .unwrap(),
        ])
        .unwrap()
    }

    fn grouping(requirements: Vec<LegRequirement>) -> FareGrouping {
        FareGrouping::new(
            1,
            vec![PaxFare::new(
                PaxTypeCode::parse("ADT").unwrap(),
                1,
                Decimal::new(100, 0),
            )],
            vec![PricingUnit::new(vec![FareUsage::new(
                0,
                "Y26",
                Decimal::new(100, 0),
            )])],
            requirements,
        )
        .unwrap()
    }

    #[test]
    fn enumerates_full_product() {
        let itin = itinerary();
        let g = grouping(vec![LegRequirement::any(), LegRequirement::any()]);

        let enumerator = CombinationEnumerator::new(&itin, &g).unwrap();
        assert_eq!(enumerator.combination_count(), 6);

        let combos: Vec<FlightCombination> = enumerator.collect();
        assert_eq!(combos.len(), 6);
        // Rightmost leg advances fastest
        assert_eq!(combos[0], FlightCombination::new(vec![0, 0]));
        assert_eq!(combos[1], FlightCombination::new(vec![0, 1]));
        assert_eq!(combos[2], FlightCombination::new(vec![1, 0]));
        assert_eq!(combos[5], FlightCombination::new(vec![2, 1]));
    }

    #[test]
    fn requirement_restricts_legs() {
        let itin = itinerary();
        let g = grouping(vec![
            LegRequirement::carrier(carrier("AA")),
            LegRequirement::any(),
        ]);

        let combos: Vec<FlightCombination> =
            CombinationEnumerator::new(&itin, &g).unwrap().collect();

        // Outbound restricted to SOPs 0 and 2
        assert_eq!(combos.len(), 4);
        assert!(combos.iter().all(|c| c.sop(0) != Some(1)));
    }

    #[test]
    fn unsatisfiable_requirement_is_empty_not_error() {
        let itin = itinerary();
        let g = grouping(vec![
            LegRequirement::carrier(carrier("LH")),
            LegRequirement::any(),
        ]);

        let mut enumerator = CombinationEnumerator::new(&itin, &g).unwrap();
        assert_eq!(enumerator.next(), None);
    }

    #[test]
    fn requirement_count_mismatch_is_an_error() {
        let itin = itinerary();
        let g = grouping(vec![LegRequirement::any()]);

        assert!(matches!(
            CombinationEnumerator::new(&itin, &g),
            Err(DomainError::RequirementCountMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
