//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A closed interval on the number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true if the interval contains no value.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Returns true if `value` lies beyond the lower end.
    pub fn is_below(&self, value: T) -> bool {
        value < self.min
    }

    /// Returns true if `value` lies beyond the upper end.
    pub fn is_above(&self, value: T) -> bool {
        value > self.max
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;

    #[test]
    fn closed_bounds() {
        let span = Interval::new(10, 13);
        assert!(span.contains(10));
        assert!(span.contains(13));
        assert!(!span.contains(14));
        assert!(span.is_below(9));
        assert!(span.is_above(14));
        assert!(!span.is_empty());
        assert!(Interval::new(0.7, 0.3).is_empty());
    }
}
