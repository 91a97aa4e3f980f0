//! Flight combination key type.

use std::fmt;

/// An ordered choice of one scheduling option per leg.
///
/// This is the unit of identity for a solution: the flight matrix and the
/// estimate matrix are both keyed by `FlightCombination`. Immutable once
/// constructed.
///
/// # Examples
///
/// ```
/// use flight_matrix::domain::FlightCombination;
///
/// let combo = FlightCombination::new(vec![0, 3]);
/// assert_eq!(combo.to_string(), "0-3");
/// assert_eq!(combo.sop(1), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct FlightCombination(Vec<usize>);

impl FlightCombination {
    /// Create a combination from per-leg scheduling option indices.
    pub fn new(sop_indices: Vec<usize>) -> Self {
        Self(sop_indices)
    }

    /// Returns the number of legs covered.
    pub fn num_legs(&self) -> usize {
        self.0.len()
    }

    /// Returns the scheduling option index chosen for a leg.
    pub fn sop(&self, leg: usize) -> Option<usize> {
        self.0.get(leg).copied()
    }

    /// Returns the per-leg indices in leg order.
    pub fn sop_indices(&self) -> &[usize] {
        &self.0
    }

    /// Returns the indices sorted ascending.
    ///
    /// Used as part of the revalidation cache key, where only the set of
    /// flights matters, not their leg assignment.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices = self.0.clone();
        indices.sort_unstable();
        indices
    }
}

impl fmt::Display for FlightCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{idx}")?;
        }
        Ok(())
    }
}
