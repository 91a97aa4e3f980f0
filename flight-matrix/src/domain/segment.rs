//! Travel segment type.
//!
//! A `TravelSegment` is one flown sector: a single flight between two
//! airports at a specific time. Scheduling options are built from one or
//! more segments.

use chrono::{Duration, NaiveDateTime};

use super::{AirportCode, CarrierCode};

/// One flown sector of a scheduling option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelSegment {
    /// Marketing carrier for this sector.
    pub carrier: CarrierCode,

    /// Flight number (without the carrier prefix).
    pub flight_number: u16,

    /// Boarding airport.
    pub origin: AirportCode,

    /// Deplaning airport.
    pub destination: AirportCode,

    /// Scheduled departure.
    pub departure: NaiveDateTime,

    /// Scheduled arrival.
    pub arrival: NaiveDateTime,
}

impl TravelSegment {
    /// Create a new travel segment.
    pub fn new(
        carrier: CarrierCode,
        flight_number: u16,
        origin: AirportCode,
        destination: AirportCode,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    ) -> Self {
        Self {
            carrier,
            flight_number,
            origin,
            destination,
            departure,
            arrival,
        }
    }

    /// Returns the flown duration of this sector.
    pub fn duration(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, hm: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hm.0, hm.1, 0)
            .unwrap()
    }

    #[test]
    fn segment_duration() {
        let seg = TravelSegment::new(
            CarrierCode::parse("AA").unwrap(),
            100,
            AirportCode::parse("JFK").unwrap(),
            AirportCode::parse("ORD").unwrap(),
            dt(1, (9, 0)),
            dt(1, (11, 30)),
        );

        assert_eq!(seg.duration(), Duration::minutes(150));
    }
}
