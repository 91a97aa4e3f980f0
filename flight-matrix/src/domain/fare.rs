//! Fare grouping types.
//!
//! A `FareGrouping` is an externally priced assignment of fares to
//! passenger types for the itinerary. Groupings arrive from the pricing
//! subsystem in non-decreasing price order and are shared across every
//! flight combination that satisfies their constraints, so the grouping a
//! worker holds is an immutable template: anything combination-specific
//! goes through `specialize_for`, which returns an owned copy with the
//! fare usages pointed at the combination's actual flights. The shared
//! template is never mutated.

use std::fmt;

use rust_decimal::Decimal;

use super::{CarrierCode, DomainError, FlightCombination, Itinerary, TravelSegment};

/// Error returned when parsing an invalid passenger type code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid passenger type code: {reason}")]
pub struct InvalidPaxTypeCode {
    reason: &'static str,
}

/// A 3-character passenger type code (e.g., "ADT", "CNN", "C09").
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaxTypeCode([u8; 3]);

impl PaxTypeCode {
    /// Parse a passenger type code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidPaxTypeCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidPaxTypeCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(InvalidPaxTypeCode {
                    reason: "must be uppercase ASCII letters or digits",
                });
            }
        }

        Ok(PaxTypeCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for PaxTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaxTypeCode({})", self.as_str())
    }
}

impl fmt::Display for PaxTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced fare for one passenger type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaxFare {
    /// Passenger type this fare applies to.
    pub pax_type: PaxTypeCode,

    /// Number of passengers of this type.
    pub count: u32,

    /// Fare amount per passenger.
    pub amount: Decimal,
}

impl PaxFare {
    /// Create a fare for `count` passengers of one type.
    pub fn new(pax_type: PaxTypeCode, count: u32, amount: Decimal) -> Self {
        Self {
            pax_type,
            count,
            amount,
        }
    }

    /// Returns the fare amount across all passengers of this type.
    pub fn extended_amount(&self) -> Decimal {
        self.amount * Decimal::from(self.count)
    }
}

/// One fare's coverage of a leg within a pricing unit.
///
/// The travel segments are the combination-specific part: the template
/// carries the segments of some representative flight, and
/// `FareGrouping::specialize_for` rewrites them to the chosen combination's
/// actual flights before revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareUsage {
    /// The leg this fare covers.
    pub leg: usize,

    /// Published fare basis code.
    pub fare_basis: String,

    /// Fare component amount.
    pub amount: Decimal,

    /// Travel segments this fare is assessed over.
    pub segments: Vec<TravelSegment>,
}

impl FareUsage {
    /// Create a fare usage covering one leg.
    pub fn new(leg: usize, fare_basis: impl Into<String>, amount: Decimal) -> Self {
        Self {
            leg,
            fare_basis: fare_basis.into(),
            amount,
            segments: Vec::new(),
        }
    }
}

/// A rule-validation unit: the fares that must pass category rules together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingUnit {
    /// Fare usages in this unit, in leg order.
    pub fare_usages: Vec<FareUsage>,
}

impl PricingUnit {
    /// Create a pricing unit from its fare usages.
    pub fn new(fare_usages: Vec<FareUsage>) -> Self {
        Self { fare_usages }
    }
}

/// Per-leg constraint a flight combination must satisfy for a grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegRequirement {
    /// Required governing carrier for the leg's chosen option, if any.
    pub governing_carrier: Option<CarrierCode>,
}

impl LegRequirement {
    /// A requirement satisfied by any scheduling option.
    pub fn any() -> Self {
        Self::default()
    }

    /// A requirement for options governed by a specific carrier.
    pub fn carrier(carrier: CarrierCode) -> Self {
        Self {
            governing_carrier: Some(carrier),
        }
    }

    /// Returns true if a scheduling option satisfies this requirement.
    pub fn allows(&self, sop: &super::Sop) -> bool {
        match self.governing_carrier {
            Some(required) => sop.governing_carrier() == required,
            None => true,
        }
    }
}

/// A priced assignment of fares to passenger types for the itinerary.
///
/// # Invariants
///
/// - At least one pricing unit
/// - `base_id` identifies the pre-duplication template: every specialized
///   copy derived from the same template reports the same `base_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareGrouping {
    base_id: u64,
    base_total: Decimal,
    tax: Decimal,
    surcharges: Decimal,
    pax_fares: Vec<PaxFare>,
    pricing_units: Vec<PricingUnit>,
    leg_requirements: Vec<LegRequirement>,
}

impl FareGrouping {
    /// Construct a grouping template.
    ///
    /// The base total is derived from the passenger fares. Tax and
    /// surcharge amounts start at zero and are attached later by the
    /// pricing flow or the alternate-date repricing pass.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no pricing units.
    pub fn new(
        base_id: u64,
        pax_fares: Vec<PaxFare>,
        pricing_units: Vec<PricingUnit>,
        leg_requirements: Vec<LegRequirement>,
    ) -> Result<Self, DomainError> {
        if pricing_units.is_empty() {
            return Err(DomainError::EmptyGrouping);
        }

        let base_total = pax_fares.iter().map(PaxFare::extended_amount).sum();

        Ok(Self {
            base_id,
            base_total,
            tax: Decimal::ZERO,
            surcharges: Decimal::ZERO,
            pax_fares,
            pricing_units,
            leg_requirements,
        })
    }

    /// Returns the identity of the pre-duplication template.
    pub fn base_id(&self) -> u64 {
        self.base_id
    }

    /// Returns the base fare total across all passengers.
    pub fn base_total(&self) -> Decimal {
        self.base_total
    }

    /// Returns the attached tax amount.
    pub fn tax(&self) -> Decimal {
        self.tax
    }

    /// Returns the attached surcharge amount.
    pub fn surcharges(&self) -> Decimal {
        self.surcharges
    }

    /// Returns the tax-adjusted total price.
    pub fn total_price(&self) -> Decimal {
        self.base_total + self.tax + self.surcharges
    }

    /// Returns the per-passenger-type fares.
    pub fn pax_fares(&self) -> &[PaxFare] {
        &self.pax_fares
    }

    /// Returns the pricing units.
    pub fn pricing_units(&self) -> &[PricingUnit] {
        &self.pricing_units
    }

    /// Returns the per-leg requirements driving combination enumeration.
    pub fn leg_requirements(&self) -> &[LegRequirement] {
        &self.leg_requirements
    }

    /// Attach a tax amount, returning the adjusted grouping.
    pub fn with_tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    /// Attach a surcharge amount, returning the adjusted grouping.
    pub fn with_surcharges(mut self, surcharges: Decimal) -> Self {
        self.surcharges = surcharges;
        self
    }

    /// Returns a copy with any previously attached tax removed.
    pub fn stripped_of_tax(&self) -> Self {
        let mut copy = self.clone();
        copy.tax = Decimal::ZERO;
        copy
    }

    /// Duplicate this grouping for a specific flight combination.
    ///
    /// Every fare usage's travel segments are reassigned to the
    /// combination's actual flights; rule outcomes depend on travel timing,
    /// so revalidation must see the real segments. The returned copy is
    /// owned by the caller and shares nothing mutable with the template.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a fare usage references a leg the itinerary does
    /// not have, or the combination does not fit the itinerary.
    pub fn specialize_for(
        &self,
        itinerary: &Itinerary,
        combination: &FlightCombination,
    ) -> Result<Self, DomainError> {
        let mut copy = self.clone();

        for unit in &mut copy.pricing_units {
            for usage in &mut unit.fare_usages {
                if usage.leg >= itinerary.num_legs() {
                    return Err(DomainError::FareUsageLegOutOfRange(usage.leg));
                }
                let sop = itinerary.sop_for(combination, usage.leg)?;
                usage.segments = sop.segments().to_vec();
            }
        }

        Ok(copy)
    }

    /// Returns a signature identifying this grouping's fare combination.
    ///
    /// Solutions sharing a signature are near-duplicate fares of each
    /// other; the store caps how many of them may be admitted.
    pub fn fare_signature(&self) -> String {
        let mut signature = String::new();
        for (i, unit) in self.pricing_units.iter().enumerate() {
            if i > 0 {
                signature.push('|');
            }
            for (j, usage) in unit.fare_usages.iter().enumerate() {
                if j > 0 {
                    signature.push('/');
                }
                signature.push_str(&usage.fare_basis);
            }
        }
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, Leg, Sop};
    use chrono::{NaiveDate, NaiveDateTime};
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
            ])
            .unwrap(),
            Leg::new(vec![nonstop("AA", "LAX", "JFK", 8, 9)]).unwrap(),
        ])
        .unwrap()
    }

    fn adt(amount: i64) -> PaxFare {
        PaxFare::new(PaxTypeCode::parse("ADT").unwrap(), 1, Decimal::new(amount, 0))
    }

    fn grouping(id: u64, amount: i64) -> FareGrouping {
        FareGrouping::new(
            id,
            vec![adt(amount)],
            vec![PricingUnit::new(vec![
                FareUsage::new(0, "Y26", Decimal::new(amount / 2, 0)),
                FareUsage::new(1, "Y26", Decimal::new(amount / 2, 0)),
            ])],
            vec![LegRequirement::any(), LegRequirement::any()],
        )
        .unwrap()
    }

    #[test]
    fn totals() {
        let g = grouping(1, 200);
        assert_eq!(g.base_total(), Decimal::new(200, 0));
        assert_eq!(g.total_price(), Decimal::new(200, 0));

        let g = g
            .with_tax(Decimal::new(35, 0))
            .with_surcharges(Decimal::new(5, 0));
        assert_eq!(g.total_price(), Decimal::new(240, 0));

        let g = g.stripped_of_tax();
        assert_eq!(g.total_price(), Decimal::new(205, 0));
    }

    #[test]
    fn pax_fare_extension() {
        let fare = PaxFare::new(PaxTypeCode::parse("ADT").unwrap(), 3, Decimal::new(100, 0));
        assert_eq!(fare.extended_amount(), Decimal::new(300, 0));
    }

    #[test]
    fn specialize_assigns_real_segments() {
        let itin = itinerary();
        let template = grouping(7, 200);

        let combo = FlightCombination::new(vec![1, 0]);
        let specialized = template.specialize_for(&itin, &combo).unwrap();

        // Template untouched
        assert!(template.pricing_units()[0].fare_usages[0].segments.is_empty());

        // Specialized copy points at BA's outbound flight
        let usage = &specialized.pricing_units()[0].fare_usages[0];
        assert_eq!(usage.segments.len(), 1);
        assert_eq!(usage.segments[0].carrier, carrier("BA"));

        // Identity of the base template is preserved
        assert_eq!(specialized.base_id(), template.base_id());
    }

    #[test]
    fn specialize_rejects_bad_combination() {
        let itin = itinerary();
        let template = grouping(7, 200);

        let combo = FlightCombination::new(vec![9, 0]);
        assert!(matches!(
            template.specialize_for(&itin, &combo),
            Err(DomainError::SopIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn requirement_filtering() {
        let itin = itinerary();
        let req = LegRequirement::carrier(carrier("BA"));

        assert!(!req.allows(itin.legs()[0].sop(0).unwrap()));
        assert!(req.allows(itin.legs()[0].sop(1).unwrap()));
        assert!(LegRequirement::any().allows(itin.legs()[0].sop(0).unwrap()));
    }

    #[test]
    fn fare_signature() {
        let g = FareGrouping::new(
            1,
            vec![adt(100)],
            vec![
                PricingUnit::new(vec![
                    FareUsage::new(0, "Y26", Decimal::new(50, 0)),
                    FareUsage::new(1, "W14", Decimal::new(50, 0)),
                ]),
                PricingUnit::new(vec![FareUsage::new(0, "K03", Decimal::ZERO)]),
            ],
            vec![LegRequirement::any(), LegRequirement::any()],
        )
        .unwrap();

        assert_eq!(g.fare_signature(), "Y26/W14|K03");
    }

    #[test]
    fn rejects_empty_grouping() {
        let result = FareGrouping::new(1, vec![adt(100)], vec![], vec![]);
        assert_eq!(result.unwrap_err(), DomainError::EmptyGrouping);
    }
}
