//! Date pair type for alternate-date shopping.

use std::fmt;

use chrono::NaiveDate;

/// An outbound/return travel date combination.
///
/// Alternate-date requests spread scheduling options over several travel
/// dates; every flight combination then belongs to exactly one date pair,
/// and quotas and price records are kept per date pair. One-way requests
/// have no return date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatePair {
    /// Outbound travel date.
    pub outbound: NaiveDate,

    /// Return travel date, absent for one-way journeys.
    pub inbound: Option<NaiveDate>,
}

impl DatePair {
    /// Create a round-trip date pair.
    pub fn round_trip(outbound: NaiveDate, inbound: NaiveDate) -> Self {
        Self {
            outbound,
            inbound: Some(inbound),
        }
    }

    /// Create a one-way date pair.
    pub fn one_way(outbound: NaiveDate) -> Self {
        Self {
            outbound,
            inbound: None,
        }
    }
}

impl fmt::Display for DatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inbound {
            Some(inbound) => write!(f, "{}/{}", self.outbound, inbound),
            None => write!(f, "{}", self.outbound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn display() {
        let rt = DatePair::round_trip(date(1), date(8));
        assert_eq!(rt.to_string(), "2024-06-01/2024-06-08");

        let ow = DatePair::one_way(date(1));
        assert_eq!(ow.to_string(), "2024-06-01");
    }

    #[test]
    fn equality() {
        assert_eq!(
            DatePair::round_trip(date(1), date(8)),
            DatePair::round_trip(date(1), date(8))
        );
        assert_ne!(
            DatePair::round_trip(date(1), date(8)),
            DatePair::round_trip(date(1), date(9))
        );
        assert_ne!(
            DatePair::one_way(date(1)),
            DatePair::round_trip(date(1), date(8))
        );
    }
}
