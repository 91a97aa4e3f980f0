//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from engine-level errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A scheduling option was built with no travel segments
    #[error("scheduling option must have at least one segment")]
    EmptySegments,

    /// Consecutive segments within a scheduling option do not connect
    #[error("segments do not connect: arrives at {arrives} but departs from {departs}")]
    SegmentsNotConnected { arrives: String, departs: String },

    /// Segment times are not in chronological order
    #[error("segment times out of order: {0}")]
    TimesOutOfOrder(&'static str),

    /// A leg was built with no scheduling options
    #[error("leg must have at least one scheduling option")]
    EmptyLeg,

    /// An itinerary was built with no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// A flight combination's arity does not match the itinerary's leg count
    #[error("combination has {got} entries but itinerary has {expected} legs")]
    LegCountMismatch { expected: usize, got: usize },

    /// A flight combination references a scheduling option that does not exist
    #[error("scheduling option index {index} out of range for leg {leg}")]
    SopIndexOutOfRange { leg: usize, index: usize },

    /// A fare usage references a leg that does not exist
    #[error("fare usage references leg {0} which does not exist")]
    FareUsageLegOutOfRange(usize),

    /// A fare grouping was built with no pricing units
    #[error("fare grouping must have at least one pricing unit")]
    EmptyGrouping,

    /// A fare grouping's leg requirements do not match the itinerary shape
    #[error("grouping has {got} leg requirements but itinerary has {expected} legs")]
    RequirementCountMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::EmptySegments;
        assert_eq!(
            err.to_string(),
            "scheduling option must have at least one segment"
        );

        let err = DomainError::SegmentsNotConnected {
            arrives: "JFK".into(),
            departs: "EWR".into(),
        };
        assert_eq!(
            err.to_string(),
            "segments do not connect: arrives at JFK but departs from EWR"
        );

        let err = DomainError::LegCountMismatch {
            expected: 2,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "combination has 3 entries but itinerary has 2 legs"
        );

        let err = DomainError::SopIndexOutOfRange { leg: 1, index: 9 };
        assert_eq!(
            err.to_string(),
            "scheduling option index 9 out of range for leg 1"
        );
    }
}
