//! Search configuration for the shopping engine.
//!
//! Every tunable ceiling and percentage the search loop consults lives in
//! one struct, resolved once at driver construction and never re-read
//! mid-loop.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration parameters for the solution search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Budget for the estimate matrix (number of neighbor entries).
    pub estimated_options: usize,

    /// Maximum flight combinations a normal worker may try without success
    /// before the search is truncated.
    pub max_flights_for_rule_validation: u32,

    /// Combination ceiling for workers searching beyond normal diversity.
    pub max_flights_beyond: u32,

    /// Combination ceiling for workers generating custom-pinned combinations.
    pub max_custom_tries: u32,

    /// Maximum fare-path revalidations a worker may perform.
    pub max_fare_paths: u32,

    /// Ceilings shrink by this divisor once the deadline policy says hurry.
    pub hurry_divisor: u32,

    /// Iterations between cooperative deadline polls.
    pub deadline_poll_interval: u64,

    /// Solutions wanted per date pair in alternate-date mode.
    pub solutions_per_date_pair: u32,

    /// Maximum admitted combinations containing a long connection.
    pub max_long_connection_solutions: u32,

    /// Minimum custom-pinned solutions a custom worker aims for.
    pub min_custom_solutions: u32,

    /// Maximum custom-pinned solutions admitted overall.
    pub max_custom_solutions: u32,

    /// First K solutions are admitted without carrier diversification;
    /// beyond K a combination must introduce a carrier not yet seen.
    pub carrier_diversity_threshold: u32,

    /// Maximum admitted solutions sharing one fare combination signature.
    pub max_repeat_fare_combinations: u32,

    /// Admitted combinations whose estimate family is smaller than this
    /// are pruned as not worth keeping.
    pub min_family_size: usize,

    /// Two options are travel-time neighbors when the shorter's elapsed
    /// time is at least this percentage of the longer's.
    pub travel_time_similarity_pct: u32,

    /// A date pair's solution is an outlier when it costs more than the
    /// pair's cheapest total times this factor.
    pub price_jump_factor: Decimal,

    /// Price-jump factor applied to mirror ("snowman") combinations.
    pub snowman_price_jump_factor: Decimal,

    /// Minimum ground time for a connection (minutes).
    /// Combinations with tighter connections are rejected.
    pub min_connection_mins: i64,

    /// Reject combinations whose options carry the carrier-restriction flag.
    pub restrict_flagged_carriers: bool,

    /// Maximum entries in the fare-path revalidation result cache.
    pub revalidation_cache_size: u64,
}

impl SearchConfig {
    /// Returns the minimum connection time as a Duration.
    pub fn min_connection(&self) -> Duration {
        Duration::minutes(self.min_connection_mins)
    }

    /// Returns the combination ceiling for a worker, hurry-adjusted.
    pub fn combination_ceiling(&self, kind: SearchKind, hurry: bool) -> u32 {
        let ceiling = match kind {
            SearchKind::Normal => self.max_flights_for_rule_validation,
            SearchKind::Beyond => self.max_flights_beyond,
            SearchKind::Custom => self.max_custom_tries,
        };
        if hurry {
            (ceiling / self.hurry_divisor).max(1)
        } else {
            ceiling
        }
    }

    /// Returns the fare-path ceiling, hurry-adjusted.
    pub fn fare_path_ceiling(&self, hurry: bool) -> u32 {
        if hurry {
            (self.max_fare_paths / self.hurry_divisor).max(1)
        } else {
            self.max_fare_paths
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            estimated_options: 300,
            max_flights_for_rule_validation: 800,
            max_flights_beyond: 200,
            max_custom_tries: 400,
            max_fare_paths: 1500,
            hurry_divisor: 4,
            deadline_poll_interval: 64,
            solutions_per_date_pair: 4,
            max_long_connection_solutions: 2,
            min_custom_solutions: 1,
            max_custom_solutions: 6,
            carrier_diversity_threshold: 10,
            max_repeat_fare_combinations: 3,
            min_family_size: 1,
            travel_time_similarity_pct: 85,
            price_jump_factor: Decimal::TWO,
            snowman_price_jump_factor: Decimal::new(25, 1), // 2.5
            min_connection_mins: 45,
            restrict_flagged_carriers: false,
            revalidation_cache_size: 10_000,
        }
    }
}

/// What a worker is searching for; picks the combination ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchKind {
    /// The ordinary shopping pass.
    Normal,

    /// Searching beyond normal diversity requirements.
    Beyond,

    /// Generating requester-pinned custom combinations.
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.max_flights_for_rule_validation, 800);
        assert_eq!(config.max_fare_paths, 1500);
        assert_eq!(config.solutions_per_date_pair, 4);
        assert_eq!(config.max_long_connection_solutions, 2);
        assert_eq!(config.carrier_diversity_threshold, 10);
        assert_eq!(config.price_jump_factor, Decimal::TWO);
        assert_eq!(config.min_connection_mins, 45);
    }

    #[test]
    fn duration_methods() {
        let config = SearchConfig::default();
        assert_eq!(config.min_connection(), Duration::minutes(45));
    }

    #[test]
    fn ceilings_per_kind() {
        let config = SearchConfig::default();

        assert_eq!(config.combination_ceiling(SearchKind::Normal, false), 800);
        assert_eq!(config.combination_ceiling(SearchKind::Beyond, false), 200);
        assert_eq!(config.combination_ceiling(SearchKind::Custom, false), 400);
    }

    #[test]
    fn hurry_shrinks_ceilings() {
        let config = SearchConfig::default();

        assert_eq!(config.combination_ceiling(SearchKind::Normal, true), 200);
        assert_eq!(config.fare_path_ceiling(true), 375);

        // Never shrinks to zero
        let tiny = SearchConfig {
            max_flights_for_rule_validation: 2,
            hurry_divisor: 8,
            ..SearchConfig::default()
        };
        assert_eq!(tiny.combination_ceiling(SearchKind::Normal, true), 1);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = SearchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_fare_paths, config.max_fare_paths);
        assert_eq!(back.price_jump_factor, config.price_jump_factor);
    }
}
