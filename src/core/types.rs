//! Value types shared by the strategies and the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Plugin status as understood by the monitoring scheduler.
///
/// Variants are declared in increasing urgency so the derived ordering picks
/// the most severe state with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Value within all configured ranges
    Ok,
    /// Warning range breached
    Warning,
    /// Critical range breached
    Critical,
    /// The check itself could not be carried out
    Unknown,
}

impl ServiceState {
    /// Process exit status for this state.
    pub fn exit_code(self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    /// Prefix written in front of the status line.
    pub fn prefix(self) -> &'static str {
        match self {
            ServiceState::Ok => "OK: ",
            ServiceState::Warning => "WARNING: ",
            ServiceState::Critical => "CRITICAL: ",
            ServiceState::Unknown => "UNKNOWN: ",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Outcome of evaluating one metric request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricSample {
    /// A computed, modifier-scaled value
    Value(f64),
    /// A rate-of-change metric with no baseline yet
    Pending,
}

/// Significant digits kept in rendered values.
const SIGNIFICANT_DIGITS: i32 = 12;

/// Renders a metric value the way the status line has always shown it:
/// twelve significant digits (`%.12g`), with `.0` appended when the result
/// looks like an integer.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value == 0.0 {
        return format!("{value:.1}");
    }

    // Exponent after rounding to the kept digits, e.g. "1.66666666667e1".
    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{value}");
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{value}");
    };

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs());
    }

    let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
    let fixed = trim_fraction(&format!("{:.*}", decimals, value));
    if fixed.contains('.') {
        fixed
    } else {
        format!("{fixed}.0")
    }
}

fn trim_fraction(digits: &str) -> String {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        digits.to_string()
    }
}
