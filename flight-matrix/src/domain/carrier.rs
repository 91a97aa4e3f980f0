//! Carrier and airport code types.

use std::fmt;

/// Error returned when parsing an invalid carrier code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid carrier code: {reason}")]
pub struct InvalidCarrierCode {
    reason: &'static str,
}

/// A valid 2-character IATA airline designator.
///
/// Carrier codes identify marketing/operating airlines (e.g., "AA" for
/// American Airlines, "BA" for British Airways). They are 2 uppercase
/// ASCII letters or digits; codes like "9W" are valid.
///
/// # Examples
///
/// ```
/// use flight_matrix::domain::CarrierCode;
///
/// let aa = CarrierCode::parse("AA").unwrap();
/// assert_eq!(aa.as_str(), "AA");
///
/// // Lowercase is rejected
/// assert!(CarrierCode::parse("aa").is_err());
///
/// // Wrong length is rejected
/// assert!(CarrierCode::parse("A").is_err());
/// assert!(CarrierCode::parse("AAL").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarrierCode([u8; 2]);

impl CarrierCode {
    /// Parse a carrier code from a string.
    ///
    /// The input must be exactly 2 uppercase ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidCarrierCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 2 {
            return Err(InvalidCarrierCode {
                reason: "must be exactly 2 characters",
            });
        }

        for &b in bytes {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(InvalidCarrierCode {
                    reason: "must be uppercase ASCII letters or digits",
                });
            }
        }

        Ok(CarrierCode([bytes[0], bytes[1]]))
    }

    /// Returns the carrier code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CarrierCode({})", self.as_str())
    }
}

impl fmt::Display for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an invalid airport code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid airport code: {reason}")]
pub struct InvalidAirportCode {
    reason: &'static str,
}

/// A valid 3-letter IATA airport code (e.g., "JFK", "LHR").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AirportCode([u8; 3]);

impl AirportCode {
    /// Parse an airport code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters.
    pub fn parse(s: &str) -> Result<Self, InvalidAirportCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidAirportCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidAirportCode {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(AirportCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the airport code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII uppercase letters
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AirportCode({})", self.as_str())
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_carrier_codes() {
        assert!(CarrierCode::parse("AA").is_ok()); // American Airlines
        assert!(CarrierCode::parse("BA").is_ok()); // British Airways
        assert!(CarrierCode::parse("LH").is_ok()); // Lufthansa
        assert!(CarrierCode::parse("9W").is_ok()); // Jet Airways
        assert!(CarrierCode::parse("B6").is_ok()); // JetBlue

        // Edge cases
        assert!(CarrierCode::parse("AA").is_ok());
        assert!(CarrierCode::parse("00").is_ok());
    }

    #[test]
    fn reject_bad_carrier_codes() {
        assert!(CarrierCode::parse("aa").is_err());
        assert!(CarrierCode::parse("A").is_err());
        assert!(CarrierCode::parse("AAL").is_err());
        assert!(CarrierCode::parse("A ").is_err());
        assert!(CarrierCode::parse("").is_err());
    }

    #[test]
    fn carrier_display() {
        let code = CarrierCode::parse("BA").unwrap();
        assert_eq!(code.to_string(), "BA");
        assert_eq!(format!("{code:?}"), "CarrierCode(BA)");
    }

    #[test]
    fn parse_valid_airport_codes() {
        assert!(AirportCode::parse("JFK").is_ok());
        assert!(AirportCode::parse("LHR").is_ok());
        assert!(AirportCode::parse("ORD").is_ok());
    }

    #[test]
    fn reject_bad_airport_codes() {
        assert!(AirportCode::parse("jfk").is_err());
        assert!(AirportCode::parse("JF").is_err());
        assert!(AirportCode::parse("JFKX").is_err());
        assert!(AirportCode::parse("JF1").is_err());
    }

    #[test]
    fn airport_display() {
        let code = AirportCode::parse("LHR").unwrap();
        assert_eq!(code.to_string(), "LHR");
    }
}
