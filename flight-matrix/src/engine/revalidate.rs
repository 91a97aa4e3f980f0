//! Fare-path revalidation with result caching.
//!
//! Whether a fare grouping is actually valid for a specific flight
//! combination depends on travel timing, so it must be re-checked per
//! combination. This is the single most expensive operation in the search
//! loop; results are cached keyed by the flights chosen and the identity
//! of the base grouping, because every duplicate derived from the same
//! template sees the same timing and the same rule outcome.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::trace;

use crate::domain::{DomainError, FareGrouping, FlightCombination, Itinerary, PricingUnit};

/// External rule-validation subsystem.
///
/// Validates one pricing unit of a combination-specialized grouping
/// against category rules. The engine only consumes the verdict.
pub trait RuleValidator: Send + Sync {
    /// True when the pricing unit passes category rules for the
    /// combination's flights.
    fn validate_pricing_unit(&self, unit: &PricingUnit, combination: &FlightCombination) -> bool;
}

/// Cache key: the set of chosen flights plus the base grouping identity.
///
/// Indices are sorted because rule outcomes depend on which flights are
/// flown, not on which leg slot selected them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RevalKey {
    flights: Vec<usize>,
    base: u64,
}

/// Outcome of one revalidation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalOutcome {
    /// Whether the fare path is valid for the combination.
    pub passed: bool,

    /// True when the verdict came from the cache.
    pub cached: bool,
}

/// The revalidator: an external validator behind a result cache.
pub struct Revalidator<V> {
    validator: V,
    cache: Cache<RevalKey, bool>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: RuleValidator> Revalidator<V> {
    /// Wrap a validator with a result cache of the given capacity.
    pub fn new(validator: V, cache_capacity: u64) -> Self {
        Self {
            validator,
            cache: Cache::builder().max_capacity(cache_capacity).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Revalidate a grouping template against a combination.
    ///
    /// On a cache miss the template is specialized to the combination (a
    /// private duplicate; the shared template is never touched) and every
    /// pricing unit is validated. On a hit the stored verdict is returned
    /// without recomputation.
    ///
    /// # Errors
    ///
    /// Returns `Err` when the combination does not fit the itinerary,
    /// which indicates a broken upstream contract.
    pub fn validate(
        &self,
        itinerary: &Itinerary,
        combination: &FlightCombination,
        template: &FareGrouping,
    ) -> Result<RevalOutcome, DomainError> {
        let key = RevalKey {
            flights: combination.sorted_indices(),
            base: template.base_id(),
        };

        if let Some(passed) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(RevalOutcome {
                passed,
                cached: true,
            });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        let specialized = template.specialize_for(itinerary, combination)?;
        let passed = specialized
            .pricing_units()
            .iter()
            .all(|unit| self.validator.validate_pricing_unit(unit, combination));

        trace!(%combination, base = template.base_id(), passed, "fare path revalidated");
        self.cache.insert(key, passed);

        Ok(RevalOutcome {
            passed,
            cached: false,
        })
    }

    /// Returns how many requests were answered from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns how many requests required recomputation.
    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
