//! Nagios-style threshold ranges.
//!
//! A range spec is parsed once per invocation into a [`ThresholdRange`] and
//! then tested against each computed metric. Testing is pure: it never
//! touches state and always gives the same answer for the same inputs.

pub mod ast;
pub mod parser;

use crate::core::{Result, ServiceState};
use std::fmt;

pub use ast::ThresholdRange;
pub use parser::parse_range;

/// Parse `spec` and test whether `value` breaches it.
///
/// An absent or blank spec never breaches. With `invert` set the matched
/// form's answer is negated.
pub fn parse_and_test(spec: Option<&str>, value: f64, invert: bool) -> Result<bool> {
    Ok(match parse_range(spec)? {
        Some(range) => range.breached_by(value) != invert,
        None => false,
    })
}

/// Warning and critical ranges for one check.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    warning: Option<ThresholdRange>,
    critical: Option<ThresholdRange>,
    invert: bool,
}

impl Thresholds {
    /// Parse both specs. Fails with a format error if either is malformed.
    pub fn parse(warning: Option<&str>, critical: Option<&str>) -> Result<Self> {
        let warning = parse_range(warning)?;
        let critical = parse_range(critical)?;
        // A critical bound below the warning bound means lower values are worse.
        let invert = match (&warning, &critical) {
            (Some(w), Some(c)) => c.bound() < w.bound(),
            _ => false,
        };
        Ok(Self {
            warning,
            critical,
            invert,
        })
    }

    /// Whether range answers are negated for this pair.
    pub fn inverted(&self) -> bool {
        self.invert
    }

    /// Severity of `value`: critical is tested before warning.
    pub fn classify(&self, value: f64) -> ServiceState {
        if self.breaches(self.critical.as_ref(), value) {
            ServiceState::Critical
        } else if self.breaches(self.warning.as_ref(), value) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }

    fn breaches(&self, range: Option<&ThresholdRange>, value: f64) -> bool {
        range.map_or(false, |r| r.breached_by(value) != self.invert)
    }
}

impl fmt::Display for Thresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(range: Option<&ThresholdRange>) -> String {
            range.map_or_else(|| "-".to_string(), ToString::to_string)
        }
        write!(
            f,
            "warning {} critical {}",
            side(self.warning.as_ref()),
            side(self.critical.as_ref())
        )?;
        if self.invert {
            f.write_str(" (inverted)")?;
        }
        Ok(())
    }
}
