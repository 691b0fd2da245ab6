//! Parsed threshold ranges.

use std::fmt;

/// A parsed warning/critical range.
///
/// `breached_by` answers whether a value falls on the alerting side of the
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdRange {
    /// `N`: alert above `N` or below zero
    Upper(f64),
    /// `N:`: alert below `N`
    AtLeast(f64),
    /// `~:N`: alert above `N`
    AtMost(f64),
    /// `N:M`: alert outside `[N, M]`
    Outside {
        /// Inclusive lower bound
        low: f64,
        /// Inclusive upper bound
        high: f64,
    },
    /// `@N:M`: alert inside `[N, M]`
    Inside {
        /// Inclusive lower bound
        low: f64,
        /// Inclusive upper bound
        high: f64,
    },
}

impl ThresholdRange {
    /// True when `value` breaches this range.
    pub fn breached_by(&self, value: f64) -> bool {
        match *self {
            ThresholdRange::Upper(max) => value > max || value < 0.0,
            ThresholdRange::AtLeast(min) => value < min,
            ThresholdRange::AtMost(max) => value > max,
            ThresholdRange::Outside { low, high } => value < low || value > high,
            ThresholdRange::Inside { low, high } => !(value < low || value > high),
        }
    }

    /// The first number written in the range. Comparing the warning and
    /// critical bounds tells whether the ranges describe "higher is better".
    pub fn bound(&self) -> f64 {
        match *self {
            ThresholdRange::Upper(n) | ThresholdRange::AtLeast(n) | ThresholdRange::AtMost(n) => n,
            ThresholdRange::Outside { low, .. } | ThresholdRange::Inside { low, .. } => low,
        }
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdRange::Upper(n) => write!(f, "{n}"),
            ThresholdRange::AtLeast(n) => write!(f, "{n}:"),
            ThresholdRange::AtMost(n) => write!(f, "~:{n}"),
            ThresholdRange::Outside { low, high } => write!(f, "{low}:{high}"),
            ThresholdRange::Inside { low, high } => write!(f, "@{low}:{high}"),
        }
    }
}
