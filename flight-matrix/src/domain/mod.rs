//! Domain types for the itinerary shopping engine.
//!
//! This module contains the core data model the search engine operates
//! over. All types enforce their invariants at construction time, so code
//! that receives these types can trust their validity.

mod carrier;
mod combination;
mod date_pair;
mod error;
mod fare;
mod itinerary;
mod segment;
mod solution;
mod sop;

pub use carrier::{AirportCode, CarrierCode, InvalidAirportCode, InvalidCarrierCode};
pub use combination::FlightCombination;
pub use date_pair::DatePair;
pub use error::DomainError;
pub use fare::{
    FareGrouping, FareUsage, InvalidPaxTypeCode, LegRequirement, PaxFare, PaxTypeCode, PricingUnit,
};
pub use itinerary::{Itinerary, Leg};
pub use segment::TravelSegment;
pub use solution::{Estimate, Solution};
pub use sop::Sop;
