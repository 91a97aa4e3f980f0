//! Worker orchestration.
//!
//! One worker per online carrier plus one interline worker run their
//! search loops in parallel on the blocking pool, sharing only the
//! combination registry and the lowest-fare board. For alternate-date
//! requests the pruning pass runs after every worker has finished, so the
//! board holds the true per-date-pair lows when pruning begins.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{Estimate, FlightCombination, Itinerary, Solution};

use super::admission::FlightChecks;
use super::altdate::TaxService;
use super::driver::{Deadline, EngineError, FareGroupingSource, SearchDriver, SearchStats};
use super::revalidate::RuleValidator;
use super::shared::WorkerScope;

/// What one worker produced.
#[derive(Debug)]
pub struct WorkerOutcome {
    /// The scope the worker covered.
    pub scope: WorkerScope,

    /// The worker's flight matrix.
    pub flights: HashMap<FlightCombination, Option<Solution>>,

    /// The worker's estimate matrix.
    pub estimates: HashMap<FlightCombination, Estimate>,

    /// Search counters, or the deferred error the worker surfaced.
    pub result: Result<SearchStats, EngineError>,
}

/// Returns the worker scopes an itinerary calls for.
///
/// One online scope per carrier able to cover every leg, plus the
/// interline scope.
pub fn worker_scopes(itinerary: &Itinerary) -> Vec<WorkerScope> {
    let mut scopes: Vec<WorkerScope> = itinerary
        .online_carriers()
        .into_iter()
        .map(WorkerScope::Online)
        .collect();
    scopes.push(WorkerScope::Interline);
    scopes
}

/// Run a set of workers to completion in parallel.
///
/// Each driver runs its synchronous loop on the blocking pool; drivers
/// for the same request should share one [`SharedState`] so duplicate
/// suppression and the fare board work across them. For alternate-date
/// itineraries the tax-adjusted pruning pass runs once every worker has
/// finished searching.
///
/// A worker's deferred error is reported in its outcome; other workers'
/// partial results are unaffected.
///
/// [`SharedState`]: super::shared::SharedState
pub async fn run_workers<S, V, C, D, T>(
    drivers: Vec<SearchDriver<S, V, C, D>>,
    options_requested: usize,
    taxes: Arc<T>,
) -> Vec<WorkerOutcome>
where
    S: FareGroupingSource + Send + 'static,
    V: RuleValidator + Send + 'static,
    C: FlightChecks + Send + 'static,
    D: Deadline + Send + 'static,
    T: TaxService + 'static,
{
    let scopes: Vec<WorkerScope> = drivers.iter().map(SearchDriver::scope).collect();

    // Phase 1: every worker searches to completion
    let handles = drivers.into_iter().map(|mut driver| {
        tokio::task::spawn_blocking(move || {
            let result = driver.run(options_requested);
            (driver, result)
        })
    });

    let mut finished = Vec::new();
    let mut dead: Vec<WorkerOutcome> = Vec::new();
    for (joined, scope) in join_all(handles).await.into_iter().zip(&scopes) {
        match joined {
            Ok((driver, result)) => finished.push((driver, result)),
            Err(join_error) => {
                warn!(%join_error, scope = %scope, "search worker died");
                dead.push(WorkerOutcome {
                    scope: *scope,
                    flights: HashMap::new(),
                    estimates: HashMap::new(),
                    result: Err(EngineError::Worker(join_error.to_string())),
                });
            }
        }
    }

    // Phase 2: alternate-date pruning against the fully populated board
    let handles = finished.into_iter().map(|(mut driver, result)| {
        let taxes = Arc::clone(&taxes);
        tokio::task::spawn_blocking(move || {
            let result = match result {
                Ok(stats) if driver.alternate_dates() => {
                    match driver.prune_alternate_dates(taxes.as_ref()) {
                        Ok(outcome) => {
                            debug!(
                                scope = %driver.scope(),
                                removed = outcome.removed.len(),
                                "pruned alternate-date outliers"
                            );
                            Ok(stats)
                        }
                        Err(error) => Err(error),
                    }
                }
                other => other,
            };
            let scope = driver.scope();
            let (flights, estimates) = driver.into_matrices();
            WorkerOutcome {
                scope,
                flights,
                estimates,
                result,
            }
        })
    });

    let mut outcomes = dead;
    for joined in join_all(handles).await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(join_error) => {
                warn!(%join_error, "pruning worker died");
            }
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, CarrierCode, Leg, Sop, TravelSegment};
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
            dt(day, dep + 5),
        );
        Arc::new(Sop::new(carrier(cx), vec![seg]).unwrap())
    }

    #[test]
    fn scopes_cover_online_carriers_and_interline() {
        let itin = Itinerary::new(vec![
            Leg::new(vec![
                nonstop("AA", "JFK", "LAX", 1, 8),
                nonstop("BA", "JFK", "LAX", 1, 10),
            ])
            .unwrap(),
            Leg::new(vec![
                nonstop("AA", "LAX", "JFK", 8, 9),
                nonstop("UA", "LAX", "JFK", 8, 11),
            ])
            .unwrap(),
        ])
        .unwrap();

        let scopes = worker_scopes(&itin);

        // Only AA covers both legs; BA and UA cannot go online
        assert_eq!(scopes.len(), 2);
        assert!(scopes.contains(&WorkerScope::Online(carrier("AA"))));
        assert!(scopes.contains(&WorkerScope::Interline));
    }
}
