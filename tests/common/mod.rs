//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::cell::Cell as TimeCell;

use mssqlprobe_lib::gateway::{Cell, Row, ScriptedGateway};
use mssqlprobe_lib::metrics::Clock;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: TimeCell<f64>,
}

impl ManualClock {
    pub fn at(seconds: f64) -> Self {
        Self {
            now: TimeCell::new(seconds),
        }
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// One single-column row per value.
pub fn int_rows(values: &[i64]) -> Vec<Row> {
    values.iter().map(|v| vec![Cell::Int(*v)]).collect()
}

/// Gateway answering each query with a single scalar, in order.
pub fn scalar_gateway(values: &[i64]) -> ScriptedGateway {
    let mut gateway = ScriptedGateway::new();
    for value in values {
        gateway.push_rows(int_rows(&[*value]));
    }
    gateway
}

pub fn databases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Assert the output line starts with the given prefix and carries one
/// perfdata token per database.
#[macro_export]
macro_rules! assert_report {
    ($report:expr, state: $state:expr, tokens: $tokens:expr) => {
        assert_eq!($report.state, $state, "Incorrect state: {}", $report.output);
        let (_, perf) = $report
            .output
            .split_once('|')
            .expect("Output has no perfdata separator");
        assert_eq!(perf.matches(";; ").count(), $tokens, "Incorrect perfdata: {}", perf);
    };
}
