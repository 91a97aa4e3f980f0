//! Diversity and quota tracking.
//!
//! Stateful counters bounding how many solutions of each kind the search
//! admits: the global two-tier carrier diversification, per-date-pair
//! option counts, long-connection solutions, and custom-pinned solutions.
//! Increments are speculative: the driver records a receipt before the
//! store insertion and rolls it back if the insertion is refused.

use std::collections::{HashMap, HashSet};

use crate::domain::{CarrierCode, DatePair};

use super::config::SearchConfig;

/// Counters for every diversity/quota dimension.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    global_admitted: u32,
    global_carriers: HashSet<CarrierCode>,
    date_pair_counts: HashMap<DatePair, u32>,
    long_connections: u32,
    custom_solutions: u32,
}

/// Record of one speculative `record` call, for rollback.
#[derive(Debug)]
pub struct QuotaReceipt {
    newly_seen: Vec<CarrierCode>,
    date_pair: Option<DatePair>,
    long_connection: bool,
    custom: bool,
}

impl QuotaTracker {
    /// Create a tracker with no consumption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of solutions admitted so far.
    pub fn admitted(&self) -> u32 {
        self.global_admitted
    }

    /// Returns the number of solutions admitted for a date pair.
    pub fn date_pair_count(&self, date_pair: DatePair) -> u32 {
        self.date_pair_counts.get(&date_pair).copied().unwrap_or(0)
    }

    /// Returns true when a date pair needs no more solutions.
    pub fn date_pair_served(&self, date_pair: DatePair, config: &SearchConfig) -> bool {
        self.date_pair_count(date_pair) >= config.solutions_per_date_pair
    }

    /// Returns true while the long-connection quota has room.
    pub fn long_connection_available(&self, config: &SearchConfig) -> bool {
        self.long_connections < config.max_long_connection_solutions
    }

    /// Returns true while the custom-solution quota has room.
    pub fn custom_available(&self, config: &SearchConfig) -> bool {
        self.custom_solutions < config.max_custom_solutions
    }

    /// Returns true once the configured minimum of custom solutions exists.
    pub fn custom_satisfied(&self, config: &SearchConfig) -> bool {
        self.custom_solutions >= config.min_custom_solutions
    }

    /// The two-tier diversification policy.
    ///
    /// The first solution of a date-pair bucket is always admitted (it is
    /// the cheapest for that bucket, since groupings arrive in price
    /// order). The first K solutions overall are admitted unconditionally;
    /// past K, a combination must introduce at least one carrier not yet
    /// seen.
    pub fn two_tier_admits(
        &self,
        carriers: &[CarrierCode],
        date_pair: Option<DatePair>,
        config: &SearchConfig,
    ) -> bool {
        if let Some(dp) = date_pair {
            if self.date_pair_count(dp) == 0 {
                return true;
            }
        }
        if self.global_admitted < config.carrier_diversity_threshold {
            return true;
        }
        carriers
            .iter()
            .any(|carrier| !self.global_carriers.contains(carrier))
    }

    /// Speculatively consume quota for a solution about to be admitted.
    ///
    /// Returns a receipt; pass it to [`rollback`](Self::rollback) if the
    /// store refuses the insertion.
    pub fn record(
        &mut self,
        carriers: &[CarrierCode],
        date_pair: Option<DatePair>,
        long_connection: bool,
        custom: bool,
    ) -> QuotaReceipt {
        self.global_admitted += 1;

        let mut newly_seen = Vec::new();
        for &carrier in carriers {
            if self.global_carriers.insert(carrier) {
                newly_seen.push(carrier);
            }
        }

        if let Some(dp) = date_pair {
            *self.date_pair_counts.entry(dp).or_insert(0) += 1;
        }
        if long_connection {
            self.long_connections += 1;
        }
        if custom {
            self.custom_solutions += 1;
        }

        QuotaReceipt {
            newly_seen,
            date_pair,
            long_connection,
            custom,
        }
    }

    /// Undo one speculative `record`.
    pub fn rollback(&mut self, receipt: QuotaReceipt) {
        self.global_admitted = self.global_admitted.saturating_sub(1);
        for carrier in receipt.newly_seen {
            self.global_carriers.remove(&carrier);
        }
        if let Some(dp) = receipt.date_pair {
            if let Some(count) = self.date_pair_counts.get_mut(&dp) {
                *count = count.saturating_sub(1);
            }
        }
        if receipt.long_connection {
            self.long_connections = self.long_connections.saturating_sub(1);
        }
        if receipt.custom {
            self.custom_solutions = self.custom_solutions.saturating_sub(1);
        }
    }

    /// Release the quota a removed solution consumed.
    ///
    /// Used when pruning removes an already admitted solution. Carriers
    /// stay in the seen set: other admitted solutions may share them, and
    /// keeping a carrier marked as seen only tightens diversification.
    pub fn release_solution(
        &mut self,
        date_pair: Option<DatePair>,
        long_connection: bool,
        custom: bool,
    ) {
        self.global_admitted = self.global_admitted.saturating_sub(1);
        if let Some(dp) = date_pair {
            if let Some(count) = self.date_pair_counts.get_mut(&dp) {
                *count = count.saturating_sub(1);
            }
        }
        if long_connection {
            self.long_connections = self.long_connections.saturating_sub(1);
        }
        if custom {
            self.custom_solutions = self.custom_solutions.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn carrier(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn date_pair(day: u32) -> DatePair {
        DatePair::one_way(NaiveDate::from_ymd_opt(2024, 6, day).unwrap())
    }

    fn config() -> SearchConfig {
        SearchConfig {
            carrier_diversity_threshold: 2,
            solutions_per_date_pair: 2,
            max_long_connection_solutions: 1,
            min_custom_solutions: 1,
            max_custom_solutions: 2,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn first_k_admitted_unconditionally() {
        let config = config();
        let mut quotas = QuotaTracker::new();
        let aa = [carrier("AA")];

        assert!(quotas.two_tier_admits(&aa, None, &config));
        quotas.record(&aa, None, false, false);

        assert!(quotas.two_tier_admits(&aa, None, &config));
        quotas.record(&aa, None, false, false);

        // Threshold reached, same carrier no longer admitted
        assert!(!quotas.two_tier_admits(&aa, None, &config));
        // But a new carrier is
        assert!(quotas.two_tier_admits(&[carrier("BA")], None, &config));
    }

    #[test]
    fn first_in_bucket_always_admitted() {
        let config = config();
        let mut quotas = QuotaTracker::new();
        let aa = [carrier("AA")];

        quotas.record(&aa, Some(date_pair(1)), false, false);
        quotas.record(&aa, Some(date_pair(1)), false, false);

        // Past the global threshold with a repeated carrier, but the first
        // solution of a fresh date pair is still kept
        assert!(!quotas.two_tier_admits(&aa, Some(date_pair(1)), &config));
        assert!(quotas.two_tier_admits(&aa, Some(date_pair(2)), &config));
    }

    #[test]
    fn date_pair_quota() {
        let config = config();
        let mut quotas = QuotaTracker::new();
        let aa = [carrier("AA")];

        assert!(!quotas.date_pair_served(date_pair(1), &config));
        quotas.record(&aa, Some(date_pair(1)), false, false);
        quotas.record(&aa, Some(date_pair(1)), false, false);
        assert!(quotas.date_pair_served(date_pair(1), &config));
        assert!(!quotas.date_pair_served(date_pair(2), &config));
    }

    #[test]
    fn long_connection_quota() {
        let config = config();
        let mut quotas = QuotaTracker::new();

        assert!(quotas.long_connection_available(&config));
        quotas.record(&[carrier("AA")], None, true, false);
        assert!(!quotas.long_connection_available(&config));
    }

    #[test]
    fn custom_quota() {
        let config = config();
        let mut quotas = QuotaTracker::new();

        assert!(!quotas.custom_satisfied(&config));
        quotas.record(&[carrier("AA")], None, false, true);
        assert!(quotas.custom_satisfied(&config));
        assert!(quotas.custom_available(&config));
        quotas.record(&[carrier("AA")], None, false, true);
        assert!(!quotas.custom_available(&config));
    }

    #[test]
    fn rollback_restores_everything() {
        let config = config();
        let mut quotas = QuotaTracker::new();

        let receipt = quotas.record(&[carrier("AA")], Some(date_pair(1)), true, true);
        quotas.rollback(receipt);

        assert_eq!(quotas.admitted(), 0);
        assert_eq!(quotas.date_pair_count(date_pair(1)), 0);
        assert!(quotas.long_connection_available(&config));
        assert!(!quotas.custom_satisfied(&config));
        // Carrier seen-set restored too
        quotas.record(&[carrier("BA")], None, false, false);
        quotas.record(&[carrier("BA")], None, false, false);
        assert!(quotas.two_tier_admits(&[carrier("AA")], None, &config));
    }

    #[test]
    fn rollback_keeps_carriers_seen_by_others() {
        let config = config();
        let mut quotas = QuotaTracker::new();

        quotas.record(&[carrier("AA")], None, false, false);
        let receipt = quotas.record(&[carrier("AA")], None, false, false);
        quotas.rollback(receipt);

        // AA was already seen before the rolled-back record
        quotas.record(&[carrier("BA")], None, false, false);
        assert!(!quotas.two_tier_admits(&[carrier("AA")], None, &config));
    }

    #[test]
    fn release_decrements_counts() {
        let config = config();
        let mut quotas = QuotaTracker::new();

        quotas.record(&[carrier("AA")], Some(date_pair(1)), true, false);
        quotas.record(&[carrier("AA")], Some(date_pair(1)), false, false);
        assert!(quotas.date_pair_served(date_pair(1), &config));

        quotas.release_solution(Some(date_pair(1)), true, false);
        assert!(!quotas.date_pair_served(date_pair(1), &config));
        assert!(quotas.long_connection_available(&config));
        assert_eq!(quotas.admitted(), 1);
    }
}
