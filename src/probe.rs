//! Runs one check mode against the requested databases.
//!
//! The probe owns no connection of its own: it is handed a [`Gateway`], a
//! [`StateStore`] and a [`Clock`], evaluates each database in order and hands
//! the samples to the aggregator.

use std::time::Duration;

use crate::core::{MetricSample, Result, ServiceState};
use crate::gateway::Gateway;
use crate::metrics::{evaluate, Catalog, Clock, EvalContext, MetricRequest, Mode, ModeSpec};
use crate::report::{aggregate, CheckResult, RangeSpecs, Report};
use crate::storage::{InMemoryStateStore, StateStore};

/// Database name reported by server-wide checks.
pub const SERVER_WIDE: &str = "_Total";

/// One check run over an open connection.
pub struct Probe<'a> {
    catalog: Catalog,
    host: String,
    gateway: &'a mut dyn Gateway,
    store: &'a mut dyn StateStore,
    clock: &'a dyn Clock,
}

impl<'a> Probe<'a> {
    /// Create a probe for `host` (its identity as given on the command line).
    pub fn new(
        catalog: Catalog,
        host: impl Into<String>,
        gateway: &'a mut dyn Gateway,
        store: &'a mut dyn StateStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            catalog,
            host: host.into(),
            gateway,
            store,
            clock,
        }
    }

    /// Run `mode` against `databases` and build the plugin report.
    pub async fn check(
        &mut self,
        mode: Mode,
        databases: &[String],
        ranges: &RangeSpecs,
        connect_time: Duration,
    ) -> Result<Report> {
        if mode == Mode::SelfTest {
            return Ok(self.self_test(databases).await);
        }

        let spec = self.catalog.get(mode)?;
        let results = if mode == Mode::TimeToConnect {
            vec![CheckResult::new(
                SERVER_WIDE,
                MetricSample::Value(connect_time.as_secs_f64()),
            )]
        } else {
            let mut results = Vec::with_capacity(databases.len());
            for database in databases {
                let request = MetricRequest::new(spec, &self.host, database)?;
                let mut ctx = EvalContext {
                    gateway: &mut *self.gateway,
                    store: &mut *self.store,
                    clock: self.clock,
                };
                let sample = evaluate(&request, &mut ctx).await?;
                results.push(CheckResult::new(database.as_str(), sample));
            }
            results
        };

        let report = aggregate(spec, &results, ranges)?;
        tracing::info!(mode = %mode, state = %report.state, databases = results.len(), "Check complete");
        Ok(report)
    }

    /// Run every counter query against every database.
    ///
    /// Baselines go to a throwaway in-memory store so the on-disk
    /// rate-of-change state is left alone.
    pub async fn self_test(&mut self, databases: &[String]) -> Report {
        let mut scratch = InMemoryStateStore::new();
        let mut lines = Vec::new();
        let mut failed = 0usize;
        let mut total = 0usize;

        let catalog = self.catalog;
        for spec in catalog.query_modes() {
            total += 1;
            match self.try_mode(spec, databases, &mut scratch).await {
                Ok(()) => lines.push(format!("{} passed!", spec.mode)),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(mode = %spec.mode, category = e.category(), error = %e, "Self-test failed");
                    lines.push(format!("{} failed with: {}", spec.mode, e));
                },
            }
        }
        lines.push(format!("{}/{} tests failed.", failed, total));

        Report {
            state: if failed == 0 {
                ServiceState::Ok
            } else {
                ServiceState::Unknown
            },
            output: lines.join("\n"),
        }
    }

    async fn try_mode(
        &mut self,
        spec: &ModeSpec,
        databases: &[String],
        scratch: &mut InMemoryStateStore,
    ) -> Result<()> {
        for database in databases {
            let request = MetricRequest::new(spec, &self.host, database)?;
            let mut ctx = EvalContext {
                gateway: &mut *self.gateway,
                store: &mut *scratch,
                clock: self.clock,
            };
            evaluate(&request, &mut ctx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProbeError;
    use crate::gateway::{Cell, ScriptedGateway};
    use crate::metrics::SystemClock;

    fn dbs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_time_to_connect_skips_queries() {
        let mut gateway = ScriptedGateway::new();
        let mut store = InMemoryStateStore::new();
        let clock = SystemClock;
        let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

        let report = probe
            .check(
                Mode::TimeToConnect,
                &dbs(&["orders"]),
                &RangeSpecs::new(Some("1"), Some("5")),
                Duration::from_millis(1500),
            )
            .await
            .unwrap();

        assert_eq!(report.state, ServiceState::Warning);
        assert!(report.output.contains("Database _Total Time to connect was 1.5s"));
        assert!(gateway.executed().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_aborts() {
        let mut gateway = ScriptedGateway::new();
        gateway
            .push_rows(vec![vec![Cell::Int(1)]])
            .push_error(ProbeError::query("Invalid object name 'sysperfinfo'."));
        let mut store = InMemoryStateStore::new();
        let clock = SystemClock;
        let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

        let err = probe
            .check(Mode::LogGrowths, &dbs(&["a", "b"]), &RangeSpecs::default(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Query(_)));
    }

    #[tokio::test]
    async fn test_self_test_reports_each_mode() {
        let mut gateway = ScriptedGateway::new();
        // Log Cache Hit Ratio fails, every other query gets one row.
        gateway.push_rows(vec![vec![Cell::Int(1)]]);
        for _ in 0..9 {
            gateway.push_rows(vec![vec![Cell::Int(3)]]);
        }
        let mut store = InMemoryStateStore::new();
        let clock = SystemClock;
        let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

        let report = probe.self_test(&dbs(&["master"])).await;

        assert_eq!(report.state, ServiceState::Unknown);
        let lines: Vec<_> = report.output.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("logcachehit failed with: "));
        assert_eq!(lines[1], "activetrans passed!");
        assert_eq!(lines[10], "1/10 tests failed.");
        assert!(store.is_empty());
    }
}
