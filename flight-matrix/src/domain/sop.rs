//! Scheduling option type.
//!
//! A `Sop` (scheduling option) is one candidate flight for a leg, possibly
//! spanning several travel segments with ground connections between them.
//! Structure is validated at construction so derived accessors never fail.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::{AirportCode, CarrierCode, DomainError, TravelSegment};

/// One candidate flight (possibly multi-segment) for a leg.
///
/// # Invariants
///
/// - At least one segment
/// - Segment times are chronological, within and across segments
/// - Consecutive segments connect (destination of one = origin of next)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sop {
    governing_carrier: CarrierCode,
    segments: Vec<TravelSegment>,
    cabin_valid: bool,
    carrier_restricted: bool,
    long_connection: bool,
}

impl Sop {
    /// Construct a scheduling option, validating segment structure.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the segment list is empty, if any segment arrives
    /// before it departs, if a ground connection goes backwards in time, or
    /// if consecutive segments do not share an airport.
    pub fn new(
        governing_carrier: CarrierCode,
        segments: Vec<TravelSegment>,
    ) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptySegments);
        }

        for seg in &segments {
            if seg.arrival < seg.departure {
                return Err(DomainError::TimesOutOfOrder("arrival before departure"));
            }
        }

        for pair in segments.windows(2) {
            if pair[1].origin != pair[0].destination {
                return Err(DomainError::SegmentsNotConnected {
                    arrives: pair[0].destination.to_string(),
                    departs: pair[1].origin.to_string(),
                });
            }
            if pair[1].departure < pair[0].arrival {
                return Err(DomainError::TimesOutOfOrder(
                    "connection departs before previous arrival",
                ));
            }
        }

        Ok(Self {
            governing_carrier,
            segments,
            cabin_valid: true,
            carrier_restricted: false,
            long_connection: false,
        })
    }

    /// Mark the requested cabin as unavailable on this option.
    pub fn with_invalid_cabin(mut self) -> Self {
        self.cabin_valid = false;
        self
    }

    /// Flag this option's carrier as restricted.
    pub fn with_carrier_restriction(mut self) -> Self {
        self.carrier_restricted = true;
        self
    }

    /// Flag this option as containing an unusually long connection.
    pub fn with_long_connection(mut self) -> Self {
        self.long_connection = true;
        self
    }

    /// Returns the governing carrier for this option.
    pub fn governing_carrier(&self) -> CarrierCode {
        self.governing_carrier
    }

    /// Returns the travel segments.
    pub fn segments(&self) -> &[TravelSegment] {
        &self.segments
    }

    /// Returns true if the requested cabin is bookable on every segment.
    pub fn cabin_valid(&self) -> bool {
        self.cabin_valid
    }

    /// Returns true if this option's carrier is restricted.
    pub fn carrier_restricted(&self) -> bool {
        self.carrier_restricted
    }

    /// Returns true if this option contains a long connection.
    pub fn has_long_connection(&self) -> bool {
        self.long_connection
    }

    /// Returns the departure time of the first segment.
    pub fn departure(&self) -> NaiveDateTime {
        // Safe: non-empty validated at construction
        self.segments[0].departure
    }

    /// Returns the arrival time of the last segment.
    pub fn arrival(&self) -> NaiveDateTime {
        // Safe: non-empty validated at construction
        self.segments[self.segments.len() - 1].arrival
    }

    /// Returns the travel date (date of first departure).
    pub fn departure_date(&self) -> NaiveDate {
        self.departure().date()
    }

    /// Returns the total elapsed travel time, ground time included.
    pub fn travel_time(&self) -> Duration {
        self.arrival().signed_duration_since(self.departure())
    }

    /// Returns the intermediate connection airports, in order.
    ///
    /// A nonstop option has an empty pattern. Two options with the same
    /// governing carrier and the same connection pattern are schedule
    /// neighbors for estimation purposes.
    pub fn connection_pattern(&self) -> Vec<AirportCode> {
        self.segments
            .iter()
            .skip(1)
            .map(|seg| seg.origin)
            .collect()
    }

    /// Returns the longest ground time between consecutive segments.
    ///
    /// Nonstop options have zero ground time.
    pub fn longest_ground_time(&self) -> Duration {
        self.segments
            .windows(2)
            .map(|pair| pair[1].departure.signed_duration_since(pair[0].arrival))
            .max()
            .unwrap_or_else(Duration::zero)
    }

    /// Returns the shortest ground time between consecutive segments, if any.
    pub fn shortest_ground_time(&self) -> Option<Duration> {
        self.segments
            .windows(2)
            .map(|pair| pair[1].departure.signed_duration_since(pair[0].arrival))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn carrier(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn airport(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    fn dt(hm: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hm.0, hm.1, 0)
            .unwrap()
    }

    fn seg(cx: &str, from: &str, to: &str, dep: (u32, u32), arr: (u32, u32)) -> TravelSegment {
        TravelSegment::new(carrier(cx), 100, airport(from), airport(to), dt(dep), dt(arr))
    }

    #[test]
    fn nonstop_sop() {
        let sop = Sop::new(
            carrier("AA"),
            vec![seg("AA", "JFK", "ORD", (9, 0), (11, 30))],
        )
        .unwrap();

        assert_eq!(sop.governing_carrier(), carrier("AA"));
        assert_eq!(sop.travel_time(), Duration::minutes(150));
        assert!(sop.connection_pattern().is_empty());
        assert_eq!(sop.longest_ground_time(), Duration::zero());
        assert!(sop.cabin_valid());
        assert!(!sop.has_long_connection());
    }

    #[test]
    fn connecting_sop() {
        let sop = Sop::new(
            carrier("AA"),
            vec![
                seg("AA", "JFK", "ORD", (9, 0), (11, 30)),
                seg("AA", "ORD", "LAX", (13, 0), (15, 30)),
            ],
        )
        .unwrap();

        assert_eq!(sop.connection_pattern(), vec![airport("ORD")]);
        assert_eq!(sop.longest_ground_time(), Duration::minutes(90));
        assert_eq!(sop.shortest_ground_time(), Some(Duration::minutes(90)));
        assert_eq!(sop.travel_time(), Duration::minutes(390));
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(
            Sop::new(carrier("AA"), vec![]),
            Err(DomainError::EmptySegments)
        );
    }

    #[test]
    fn rejects_disconnected_segments() {
        let result = Sop::new(
            carrier("AA"),
            vec![
                seg("AA", "JFK", "ORD", (9, 0), (11, 30)),
                seg("AA", "MDW", "LAX", (13, 0), (15, 30)),
            ],
        );

        assert!(matches!(
            result,
            Err(DomainError::SegmentsNotConnected { .. })
        ));
    }

    #[test]
    fn rejects_backwards_connection() {
        let result = Sop::new(
            carrier("AA"),
            vec![
                seg("AA", "JFK", "ORD", (9, 0), (11, 30)),
                seg("AA", "ORD", "LAX", (11, 0), (15, 30)),
            ],
        );

        assert!(matches!(result, Err(DomainError::TimesOutOfOrder(_))));
    }

    #[test]
    fn flags() {
        let sop = Sop::new(
            carrier("AA"),
            vec![seg("AA", "JFK", "ORD", (9, 0), (11, 30))],
        )
        .unwrap()
        .with_invalid_cabin()
        .with_carrier_restriction()
        .with_long_connection();

        assert!(!sop.cabin_valid());
        assert!(sop.carrier_restricted());
        assert!(sop.has_long_connection());
    }
}
