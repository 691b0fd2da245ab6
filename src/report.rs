//! Result aggregation and plugin output.
//!
//! Every database gets a severity from the thresholds; the worst one decides
//! the prefix and the exit status. The output line has the shape
//!
//! ```text
//! OK:  Database a ... is 1.0 Database b ... is 2.0|a_label=1.0;w;c;; b_label=2.0;w;c;;
//! ```
//!
//! Every status segment is preceded by a space and every performance-data
//! token is followed by one.

use crate::core::{format_value, MetricSample, ProbeError, Result, ServiceState};
use crate::metrics::ModeSpec;
use crate::threshold::Thresholds;

/// Sample computed for one database.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// Database (or `_Total` for server-wide checks)
    pub database: String,
    /// Computed sample
    pub sample: MetricSample,
}

impl CheckResult {
    /// Create a result
    pub fn new(database: impl Into<String>, sample: MetricSample) -> Self {
        Self {
            database: database.into(),
            sample,
        }
    }
}

/// Final plugin output.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Overall state
    pub state: ServiceState,
    /// Everything printed on stdout
    pub output: String,
}

impl Report {
    /// Report for a fault that prevented the check: the message alone, UNKNOWN.
    pub fn unknown(err: &ProbeError) -> Self {
        Self {
            state: ServiceState::Unknown,
            output: err.to_string(),
        }
    }

    /// Process exit status.
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }
}

/// Threshold specs exactly as given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeSpecs {
    /// Warning range
    pub warning: Option<String>,
    /// Critical range
    pub critical: Option<String>,
}

impl RangeSpecs {
    /// Create from optional specs
    pub fn new(warning: Option<&str>, critical: Option<&str>) -> Self {
        Self {
            warning: warning.map(str::to_string),
            critical: critical.map(str::to_string),
        }
    }

    /// Parse both ranges.
    pub fn parse(&self) -> Result<Thresholds> {
        Thresholds::parse(self.warning.as_deref(), self.critical.as_deref())
    }
}

/// Classify every result and compose the output line.
pub fn aggregate(spec: &ModeSpec, results: &[CheckResult], ranges: &RangeSpecs) -> Result<Report> {
    let thresholds = ranges.parse()?;
    tracing::debug!(mode = %spec.mode, %thresholds, "Classifying");
    let warning = ranges.warning.as_deref().unwrap_or("");
    let critical = ranges.critical.as_deref().unwrap_or("");

    let mut state = ServiceState::Ok;
    let mut status = String::new();
    let mut perfdata = String::new();

    for result in results {
        let (db_state, shown, perf_value) = match result.sample {
            MetricSample::Value(value) => {
                let text = format_value(value);
                let perf = format!("{}{}", text, spec.unit);
                (thresholds.classify(value), text, perf)
            },
            // Nothing to compare yet; the next run will have a rate.
            MetricSample::Pending => (ServiceState::Ok, "None".to_string(), "U".to_string()),
        };
        tracing::debug!(database = %result.database, state = %db_state, value = %shown, "Classified");
        state = state.max(db_state);

        status.push(' ');
        status.push_str(&spec.render_stdout(&result.database, &shown));

        perfdata.push_str(&format!(
            "{}={};{};{};; ",
            spec.perf_label(&result.database),
            perf_value,
            warning,
            critical
        ));
    }

    Ok(Report {
        state,
        output: format!("{}{}|{}", state.prefix(), status, perfdata),
    })
}
