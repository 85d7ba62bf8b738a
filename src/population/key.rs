//! Totally ordered population keys.

use std::cmp::Ordering;
use std::fmt;

/// Effective fitness used to rank a genome inside a population.
///
/// Higher is always better: when the run minimises, the key is the negated
/// fitness. Keys are never NaN and `-0.0` is folded into `0.0`, so equality
/// matches numeric equality.
#[derive(Debug, Clone, Copy)]
pub struct FitnessKey(f64);

impl FitnessKey {
    /// Returns `None` for NaN.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The smallest key strictly greater than this one, or `None` at
    /// positive infinity.
    pub fn next_up(self) -> Option<Self> {
        let x = self.0;
        if x == f64::INFINITY {
            return None;
        }
        let next = if x == 0.0 {
            f64::from_bits(1)
        } else if x > 0.0 {
            f64::from_bits(x.to_bits() + 1)
        } else {
            f64::from_bits(x.to_bits() - 1)
        };
        Self::new(next)
    }
}

impl PartialEq for FitnessKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FitnessKey {}

impl PartialOrd for FitnessKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FitnessKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for FitnessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
