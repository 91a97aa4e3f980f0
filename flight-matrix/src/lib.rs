//! Itinerary shopping solution-search engine.
//!
//! Given a multi-leg travel request with candidate flights per leg and a
//! stream of increasingly expensive priced fare groupings, produce a
//! bounded, diversified flight matrix of priced solutions plus a larger
//! estimate matrix of cheaply derived neighbors.

pub mod domain;
pub mod engine;
