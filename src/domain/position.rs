use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// Rank of a member within its parent.
///
/// Positions are finite `f64` values compared with a total order, so they
/// can be used as sort keys and compared for equality. Normalized sequences
/// use `1.0, 2.0, ...`; fractional values appear between normalizations when
/// an item is dropped between two neighbours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(f64);

impl Position {
    /// First position of a freshly normalized parent
    pub const BASE: Position = Position(1.0);

    /// Creates a position, rejecting NaN and infinities
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Position of the `index`-th member (zero-based) in a sequence
    /// normalized from `base` with step 1
    pub fn nth(base: Position, index: usize) -> Self {
        Self(base.0 + index as f64)
    }

    /// A position strictly before `self`, if one is representable
    pub fn before(self) -> Option<Self> {
        Self::new(self.0 - 1.0).filter(|p| *p < self)
    }

    /// A position strictly after `self`, if one is representable
    pub fn after(self) -> Option<Self> {
        Self::new(self.0 + 1.0).filter(|p| *p > self)
    }

    /// The midpoint of `low` and `high`, if it lies strictly between them
    pub fn between(low: Self, high: Self) -> Option<Self> {
        // halves first so that extreme values cannot overflow
        let mid = low.0 / 2.0 + high.0 / 2.0;
        Self::new(mid).filter(|p| low < *p && *p < high)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Position {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite() {
        assert!(Position::new(f64::NAN).is_none());
        assert!(Position::new(f64::INFINITY).is_none());
        assert_eq!(Position::new(2.5).map(Position::value), Some(2.5));
    }

    #[test]
    fn test_between() {
        let mid = Position::between(Position::from(1), Position::from(2)).unwrap();
        assert_eq!(mid.value(), 1.5);

        assert!(Position::between(Position::from(2), Position::from(2)).is_none());
        assert!(Position::between(Position::from(3), Position::from(2)).is_none());
    }

    #[test]
    fn test_between_adjacent_floats_is_exhausted() {
        let low = Position::from(1);
        let high = Position::new(f64::from_bits(1.0f64.to_bits() + 1)).unwrap();
        assert!(Position::between(low, high).is_none());
    }

    #[test]
    fn test_before_and_after() {
        assert_eq!(Position::BASE.before(), Some(Position::from(0)));
        assert_eq!(Position::BASE.after(), Some(Position::from(2)));

        // beyond 2^53 adding one no longer changes the value
        let huge = Position::new(2f64.powi(54)).unwrap();
        assert!(huge.after().is_none());
        assert!(huge.before().is_none());
    }

    #[test]
    fn test_nth() {
        assert_eq!(Position::nth(Position::BASE, 0), Position::from(1));
        assert_eq!(Position::nth(Position::BASE, 4), Position::from(5));
    }
}
