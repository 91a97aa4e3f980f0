//! Admission filtering for candidate flight combinations.
//!
//! Cheap, non-pricing checks that accept or reject a candidate before the
//! expensive fare-path revalidation. The filter is a pure predicate over
//! the candidate and current search state; admission side effects happen
//! only after revalidation succeeds.

use std::collections::HashSet;

use chrono::Duration;
use serde::Serialize;

use crate::domain::{DomainError, FlightCombination, Itinerary};

use super::config::{SearchConfig, SearchKind};
use super::quotas::QuotaTracker;
use super::shared::{CombinationRegistry, WorkerScope};
use super::store::SolutionStore;

/// Why a candidate combination was rejected before revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Already present in the flight or estimate matrix.
    AlreadyKnown,

    /// A companion worker covering the complementary scope already
    /// published this combination.
    PublishedByCompanion,

    /// The requested cabin is not bookable on some leg.
    CabinInvalid,

    /// A connection is tighter than the minimum connection time.
    MinConnectionViolated,

    /// A chosen option's carrier is restricted in restricted mode.
    RestrictedCarrier,

    /// The combination's date pair needs no more solutions.
    DatePairServed,

    /// A custom worker only produces requester-pinned combinations.
    NotCustomPinned,

    /// Custom-pinned combinations are exclusive to the custom worker.
    CustomPinned,

    /// The custom-solution quota is exhausted.
    CustomQuotaExhausted,

    /// The long-connection quota is exhausted.
    LongConnectionQuota,

    /// The combination belongs to another worker's scope.
    OutsideScope,

    /// Past the diversity threshold without introducing a new carrier.
    CarrierDiversity,

    /// The repeat ceiling for this fare combination is reached.
    RepeatFareCeiling,
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The candidate may proceed to revalidation.
    Accept,

    /// The candidate is rejected; the reason is reported to diagnostics.
    Reject(RejectReason),
}

/// External checks on a combination's flights.
///
/// Cabin availability and minimum-connection-time evaluation belong to
/// the itinerary data model built before search begins; the engine only
/// consumes their verdicts.
pub trait FlightChecks: Send + Sync {
    /// True when the requested cabin is bookable on every leg.
    fn cabin_valid(&self, itinerary: &Itinerary, combination: &FlightCombination) -> bool;

    /// True when every connection meets the minimum connection time.
    fn min_connection_ok(&self, itinerary: &Itinerary, combination: &FlightCombination) -> bool;
}

/// Checks derived from scheduling option metadata.
#[derive(Debug, Clone)]
pub struct MetadataChecks {
    min_connection: Duration,
}

impl MetadataChecks {
    /// Create checks enforcing the given minimum connection time.
    pub fn new(min_connection: Duration) -> Self {
        Self { min_connection }
    }
}

impl FlightChecks for MetadataChecks {
    fn cabin_valid(&self, itinerary: &Itinerary, combination: &FlightCombination) -> bool {
        itinerary
            .sops_for(combination)
            .map(|sops| sops.iter().all(|sop| sop.cabin_valid()))
            .unwrap_or(false)
    }

    fn min_connection_ok(&self, itinerary: &Itinerary, combination: &FlightCombination) -> bool {
        itinerary
            .sops_for(combination)
            .map(|sops| {
                sops.iter().all(|sop| {
                    sop.shortest_ground_time()
                        .is_none_or(|ground| ground >= self.min_connection)
                })
            })
            .unwrap_or(false)
    }
}

/// The admission predicate, borrowing the state it consults.
pub struct AdmissionFilter<'a> {
    pub itinerary: &'a Itinerary,
    pub config: &'a SearchConfig,
    pub scope: WorkerScope,
    pub kind: SearchKind,
    pub store: &'a SolutionStore,
    pub quotas: &'a QuotaTracker,
    pub registry: &'a CombinationRegistry,
    pub checks: &'a dyn FlightChecks,
    pub custom: &'a HashSet<FlightCombination>,
}

impl AdmissionFilter<'_> {
    /// Evaluate a candidate combination against every cheap check.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for broken upstream contracts (a combination
    /// that does not fit the itinerary); ordinary rejections are
    /// `Ok(Admission::Reject(_))`.
    pub fn check(&self, combination: &FlightCombination) -> Result<Admission, DomainError> {
        use Admission::Reject;

        if self.store.already_known(combination) {
            return Ok(Reject(RejectReason::AlreadyKnown));
        }

        if self.registry.published_elsewhere(self.scope, combination) {
            return Ok(Reject(RejectReason::PublishedByCompanion));
        }

        if !self.checks.cabin_valid(self.itinerary, combination) {
            return Ok(Reject(RejectReason::CabinInvalid));
        }

        if !self.checks.min_connection_ok(self.itinerary, combination) {
            return Ok(Reject(RejectReason::MinConnectionViolated));
        }

        if self.config.restrict_flagged_carriers {
            let sops = self.itinerary.sops_for(combination)?;
            if sops.iter().any(|sop| sop.carrier_restricted()) {
                return Ok(Reject(RejectReason::RestrictedCarrier));
            }
        }

        let date_pair = if self.itinerary.alternate_dates() {
            let dp = self.itinerary.date_pair(combination)?;
            if self.quotas.date_pair_served(dp, self.config) {
                return Ok(Reject(RejectReason::DatePairServed));
            }
            Some(dp)
        } else {
            None
        };

        let pinned = self.custom.contains(combination);
        match self.kind {
            SearchKind::Custom => {
                if !pinned {
                    return Ok(Reject(RejectReason::NotCustomPinned));
                }
                if !self.quotas.custom_available(self.config) {
                    return Ok(Reject(RejectReason::CustomQuotaExhausted));
                }
            }
            SearchKind::Normal | SearchKind::Beyond => {
                if pinned {
                    return Ok(Reject(RejectReason::CustomPinned));
                }
            }
        }

        if self.itinerary.has_long_connection(combination)?
            && !self.quotas.long_connection_available(self.config)
        {
            return Ok(Reject(RejectReason::LongConnectionQuota));
        }

        let online = self.itinerary.online_carrier(combination)?;
        match (self.scope, online) {
            (WorkerScope::Online(own), Some(carrier)) if carrier == own => {}
            (WorkerScope::Online(_), _) => return Ok(Reject(RejectReason::OutsideScope)),
            (WorkerScope::Interline, None) => {}
            (WorkerScope::Interline, Some(_)) => {
                return Ok(Reject(RejectReason::OutsideScope));
            }
        }

        // Custom-pinned combinations are exempt from diversification
        if !pinned {
            let carriers = self.itinerary.governing_carriers(combination)?;
            if !self.quotas.two_tier_admits(&carriers, date_pair, self.config) {
                return Ok(Reject(RejectReason::CarrierDiversity));
            }
        }

        Ok(Admission::Accept)
    }
}
