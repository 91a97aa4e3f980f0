//! Leg and itinerary types.
//!
//! An `Itinerary` is the shopped journey: an ordered list of legs, each
//! carrying the candidate scheduling options for that leg. It uses
//! `Arc<Sop>` for cheap sharing between workers and answers the structural
//! questions the engine asks about a flight combination.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{CarrierCode, DatePair, DomainError, FlightCombination, Sop};

/// One directional leg of the journey with its candidate flights.
///
/// # Invariants
///
/// - At least one scheduling option
#[derive(Debug, Clone)]
pub struct Leg {
    sops: Vec<Arc<Sop>>,
}

impl Leg {
    /// Construct a leg from its scheduling options.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the option list is empty.
    pub fn new(sops: Vec<Arc<Sop>>) -> Result<Self, DomainError> {
        if sops.is_empty() {
            return Err(DomainError::EmptyLeg);
        }
        Ok(Self { sops })
    }

    /// Returns all scheduling options for this leg.
    pub fn sops(&self) -> &[Arc<Sop>] {
        &self.sops
    }

    /// Returns the scheduling option at an index.
    pub fn sop(&self, index: usize) -> Option<&Arc<Sop>> {
        self.sops.get(index)
    }

    /// Returns the number of scheduling options.
    pub fn num_sops(&self) -> usize {
        self.sops.len()
    }
}

/// The shopped journey: ordered legs plus request-level flags.
///
/// # Invariants
///
/// - At least one leg
#[derive(Debug, Clone)]
pub struct Itinerary {
    legs: Vec<Leg>,
    alternate_dates: bool,
}

impl Itinerary {
    /// Construct an itinerary from its legs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the leg list is empty.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }
        Ok(Self {
            legs,
            alternate_dates: false,
        })
    }

    /// Mark this as an alternate-date request.
    pub fn with_alternate_dates(mut self) -> Self {
        self.alternate_dates = true;
        self
    }

    /// Returns true for alternate-date requests.
    pub fn alternate_dates(&self) -> bool {
        self.alternate_dates
    }

    /// Returns the legs in journey order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the number of legs.
    pub fn num_legs(&self) -> usize {
        self.legs.len()
    }

    /// Resolve the scheduling option a combination chose for one leg.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the combination's arity does not match this
    /// itinerary or the index is out of range. Either indicates a broken
    /// upstream contract, not a user error.
    pub fn sop_for(
        &self,
        combination: &FlightCombination,
        leg: usize,
    ) -> Result<&Arc<Sop>, DomainError> {
        if combination.num_legs() != self.legs.len() {
            return Err(DomainError::LegCountMismatch {
                expected: self.legs.len(),
                got: combination.num_legs(),
            });
        }
        let index = combination
            .sop(leg)
            .ok_or(DomainError::SopIndexOutOfRange { leg, index: 0 })?;
        self.legs[leg]
            .sop(index)
            .ok_or(DomainError::SopIndexOutOfRange { leg, index })
    }

    /// Resolve every scheduling option a combination chose, in leg order.
    pub fn sops_for(
        &self,
        combination: &FlightCombination,
    ) -> Result<Vec<&Arc<Sop>>, DomainError> {
        (0..self.legs.len())
            .map(|leg| self.sop_for(combination, leg))
            .collect()
    }

    /// Returns the single governing carrier of a combination, if it has one.
    ///
    /// `Some(carrier)` means every leg's chosen option is governed by
    /// `carrier` (an "online" combination); `None` means the combination is
    /// interline.
    pub fn online_carrier(
        &self,
        combination: &FlightCombination,
    ) -> Result<Option<CarrierCode>, DomainError> {
        let sops = self.sops_for(combination)?;
        let first = sops[0].governing_carrier();
        if sops.iter().all(|sop| sop.governing_carrier() == first) {
            Ok(Some(first))
        } else {
            Ok(None)
        }
    }

    /// Returns the per-leg governing carriers of a combination.
    pub fn governing_carriers(
        &self,
        combination: &FlightCombination,
    ) -> Result<Vec<CarrierCode>, DomainError> {
        Ok(self
            .sops_for(combination)?
            .iter()
            .map(|sop| sop.governing_carrier())
            .collect())
    }

    /// Returns the date pair a combination belongs to.
    ///
    /// Outbound date comes from the first leg's chosen option; the return
    /// date from the last leg's, for journeys with more than one leg.
    pub fn date_pair(&self, combination: &FlightCombination) -> Result<DatePair, DomainError> {
        let sops = self.sops_for(combination)?;
        let outbound = sops[0].departure_date();
        if sops.len() > 1 {
            Ok(DatePair::round_trip(
                outbound,
                sops[sops.len() - 1].departure_date(),
            ))
        } else {
            Ok(DatePair::one_way(outbound))
        }
    }

    /// Returns every date pair the itinerary's options can produce.
    pub fn date_pairs(&self) -> BTreeSet<DatePair> {
        let outbound_dates: BTreeSet<_> = self.legs[0]
            .sops()
            .iter()
            .map(|sop| sop.departure_date())
            .collect();

        if self.legs.len() == 1 {
            return outbound_dates.into_iter().map(DatePair::one_way).collect();
        }

        let inbound_dates: BTreeSet<_> = self.legs[self.legs.len() - 1]
            .sops()
            .iter()
            .map(|sop| sop.departure_date())
            .collect();

        outbound_dates
            .iter()
            .flat_map(|out| {
                inbound_dates
                    .iter()
                    .map(|inb| DatePair::round_trip(*out, *inb))
            })
            .collect()
    }

    /// Returns true if a combination contains a long-connection option.
    pub fn has_long_connection(
        &self,
        combination: &FlightCombination,
    ) -> Result<bool, DomainError> {
        Ok(self
            .sops_for(combination)?
            .iter()
            .any(|sop| sop.has_long_connection()))
    }

    /// Classify a combination as a mirror ("snowman") itinerary.
    ///
    /// A snowman is a two-leg journey where each chosen option has exactly
    /// two segments and the outbound's connecting carrier equals the
    /// inbound's first carrier, so the connection mirrors on both legs.
    pub fn is_snowman(&self, combination: &FlightCombination) -> Result<bool, DomainError> {
        if self.legs.len() != 2 {
            return Ok(false);
        }
        let sops = self.sops_for(combination)?;
        let outbound = sops[0].segments();
        let inbound = sops[1].segments();
        if outbound.len() != 2 || inbound.len() != 2 {
            return Ok(false);
        }
        Ok(outbound[1].carrier == inbound[0].carrier)
    }

    /// Returns the carriers able to cover the whole journey online.
    ///
    /// A carrier qualifies when every leg offers at least one option it
    /// governs. These are the carriers worth a dedicated online worker.
    pub fn online_carriers(&self) -> BTreeSet<CarrierCode> {
        let mut candidates: BTreeSet<CarrierCode> = self.legs[0]
            .sops()
            .iter()
            .map(|sop| sop.governing_carrier())
            .collect();

        for leg in &self.legs[1..] {
            let present: BTreeSet<CarrierCode> =
                leg.sops().iter().map(|sop| sop.governing_carrier()).collect();
            candidates = candidates.intersection(&present).copied().collect();
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, TravelSegment};
    use chrono::{NaiveDate, NaiveDateTime};

    fn carrier(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn seg(cx: &str, from: &str, to: &str, day: u32, dep: u32, arr: u32) -> TravelSegment {
        TravelSegment::new(
            carrier(cx),
            100,
            AirportCode::parse(from).unwrap(),
            AirportCode::parse(to).unwrap(),
            dt(day, dep),
            dt(day, arr),
        )
    }

    fn nonstop(cx: &str, from: &str, to: &str, day: u32, dep: u32) -> Arc<Sop> {
        Arc::new(Sop::new(carrier(cx), vec![seg(cx, from, to, day, dep, dep + 3)]).unwrap())
    }

    fn round_trip() -> Itinerary {
        let out = Leg::new(vec![
            nonstop("AA", "JFK", "LAX", 1, 8),
            nonstop("BA", "JFK", "LAX", 1, 10),
            nonstop("AA", "JFK", "LAX", 2, 8),
        ])
        .unwrap();
        let back = Leg::new(vec![
            nonstop("AA", "LAX", "JFK", 8, 9),
            nonstop("BA", "LAX", "JFK", 9, 9),
        ])
        .unwrap();
        Itinerary::new(vec![out, back]).unwrap()
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Leg::new(vec![]).unwrap_err(), DomainError::EmptyLeg);
        assert_eq!(
            Itinerary::new(vec![]).unwrap_err(),
            DomainError::EmptyItinerary
        );
    }

    #[test]
    fn online_carrier_detection() {
        let itin = round_trip();

        // AA both ways
        let combo = FlightCombination::new(vec![0, 0]);
        assert_eq!(itin.online_carrier(&combo).unwrap(), Some(carrier("AA")));

        // AA out, BA back
        let combo = FlightCombination::new(vec![0, 1]);
        assert_eq!(itin.online_carrier(&combo).unwrap(), None);
    }

    #[test]
    fn date_pair_of_combination() {
        let itin = round_trip();

        let combo = FlightCombination::new(vec![0, 0]);
        assert_eq!(
            itin.date_pair(&combo).unwrap(),
            DatePair::round_trip(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()
            )
        );

        let combo = FlightCombination::new(vec![2, 1]);
        assert_eq!(
            itin.date_pair(&combo).unwrap(),
            DatePair::round_trip(
                NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()
            )
        );
    }

    #[test]
    fn all_date_pairs() {
        let itin = round_trip();
        // 2 outbound dates x 2 inbound dates
        assert_eq!(itin.date_pairs().len(), 4);
    }

    #[test]
    fn combination_arity_is_checked() {
        let itin = round_trip();

        let combo = FlightCombination::new(vec![0]);
        assert!(matches!(
            itin.sop_for(&combo, 0),
            Err(DomainError::LegCountMismatch { .. })
        ));

        let combo = FlightCombination::new(vec![0, 9]);
        assert!(matches!(
            itin.sop_for(&combo, 1),
            Err(DomainError::SopIndexOutOfRange { leg: 1, index: 9 })
        ));
    }

    #[test]
    fn snowman_classification() {
        let out = Arc::new(
            Sop::new(
                carrier("AA"),
                vec![
                    seg("AA", "JFK", "ORD", 1, 8, 10),
                    seg("UA", "ORD", "LAX", 1, 12, 15),
                ],
            )
            .unwrap(),
        );
        let back_mirror = Arc::new(
            Sop::new(
                carrier("AA"),
                vec![
                    seg("UA", "LAX", "ORD", 8, 8, 11),
                    seg("AA", "ORD", "JFK", 8, 13, 16),
                ],
            )
            .unwrap(),
        );
        let back_plain = Arc::new(
            Sop::new(
                carrier("AA"),
                vec![
                    seg("DL", "LAX", "ORD", 8, 8, 11),
                    seg("AA", "ORD", "JFK", 8, 13, 16),
                ],
            )
            .unwrap(),
        );

        let itin = Itinerary::new(vec![
            Leg::new(vec![out]).unwrap(),
            Leg::new(vec![back_mirror, back_plain]).unwrap(),
        ])
        .unwrap();

        // Outbound connects on UA, inbound starts on UA: mirror
        assert!(itin.is_snowman(&FlightCombination::new(vec![0, 0])).unwrap());
        // Inbound starts on DL: not a mirror
        assert!(!itin.is_snowman(&FlightCombination::new(vec![0, 1])).unwrap());
    }

    #[test]
    fn online_carriers_for_workers() {
        let itin = round_trip();
        let carriers = itin.online_carriers();
        // AA and BA appear on both legs
        assert!(carriers.contains(&carrier("AA")));
        assert!(carriers.contains(&carrier("BA")));
        assert_eq!(carriers.len(), 2);
    }
}
