//! End-to-end checks through the probe with a scripted server.

mod common;

use std::time::Duration;

use common::{databases, int_rows, scalar_gateway, ManualClock};
use mssqlprobe_lib::core::{ProbeError, ServiceState};
use mssqlprobe_lib::gateway::{Cell, ScriptedGateway};
use mssqlprobe_lib::metrics::{Catalog, Mode};
use mssqlprobe_lib::probe::Probe;
use mssqlprobe_lib::report::RangeSpecs;
use mssqlprobe_lib::storage::InMemoryStateStore;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_cache_hit_ratio_across_databases() {
    let mut gateway = ScriptedGateway::new();
    gateway
        .push_rows(int_rows(&[99, 100]))
        .push_rows(int_rows(&[80, 100]));
    let mut store = InMemoryStateStore::new();
    let clock = ManualClock::at(0.0);
    let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

    let report = probe
        .check(
            Mode::LogCacheHit,
            &databases(&["orders", "sales"]),
            &RangeSpecs::new(Some("95"), Some("90")),
            Duration::ZERO,
        )
        .await
        .unwrap();

    assert_report!(report, state: ServiceState::Critical, tokens: 2);
    assert_eq!(report.exit_code(), 2);
    assert!(report.output.contains("orders"));
    assert!(report.output.contains("sales"));
    assert!(report.output.contains("99.0"));
    assert!(report.output.contains("80.0"));
}

#[tokio::test]
async fn test_queries_target_each_database() {
    let mut gateway = scalar_gateway(&[3, 4]);
    let mut store = InMemoryStateStore::new();
    let clock = ManualClock::at(0.0);
    {
        let mut probe =
            Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);
        probe
            .check(
                Mode::ActiveTransactions,
                &databases(&["orders", "o'brien"]),
                &RangeSpecs::default(),
                Duration::ZERO,
            )
            .await
            .unwrap();
    }

    let executed = gateway.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("'orders'"));
    assert!(executed[1].contains("'o''brien'"));
}

#[tokio::test]
async fn test_rate_mode_first_run_then_value() {
    let mut gateway = scalar_gateway(&[1_000, 1_600]);
    let mut store = InMemoryStateStore::new();
    let clock = ManualClock::at(10_000.0);
    let dbs = databases(&["orders"]);
    let ranges = RangeSpecs::new(Some("50"), Some("100"));

    let first = {
        let mut probe =
            Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);
        probe
            .check(Mode::TransactionsPerSecond, &dbs, &ranges, Duration::ZERO)
            .await
            .unwrap()
    };
    assert_eq!(first.state, ServiceState::Ok);
    assert!(first.output.contains("=U;50;100;; "));

    clock.advance(10.0);
    let second = {
        let mut probe =
            Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);
        probe
            .check(Mode::TransactionsPerSecond, &dbs, &ranges, Duration::ZERO)
            .await
            .unwrap()
    };
    assert_report!(second, state: ServiceState::Warning, tokens: 1);
    assert!(second.output.contains("60.0"));
}

#[tokio::test]
async fn test_non_numeric_result_is_query_error() {
    let mut gateway = ScriptedGateway::new();
    gateway.push_rows(vec![vec![Cell::Text("n/a".to_string())]]);
    let mut store = InMemoryStateStore::new();
    let clock = ManualClock::at(0.0);
    let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

    let err = probe
        .check(
            Mode::DataSize,
            &databases(&["orders"]),
            &RangeSpecs::default(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Query(_)));
}

#[tokio::test]
async fn test_time_to_connect_output() {
    let mut gateway = ScriptedGateway::new();
    let mut store = InMemoryStateStore::new();
    let clock = ManualClock::at(0.0);
    let mut probe = Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

    let report = probe
        .check(
            Mode::TimeToConnect,
            &databases(&["orders", "sales"]),
            &RangeSpecs::new(Some("2"), Some("5")),
            Duration::from_millis(250),
        )
        .await
        .unwrap();

    assert_eq!(
        report.output,
        "OK:  Database _Total Time to connect was 0.25s|_Total_time=0.25s;2;5;; "
    );
}

#[tokio::test]
async fn test_idle_cache_ratio_is_not_reported_healthy() {
    for rows in [[0, 0], [5, 0]] {
        let mut gateway = ScriptedGateway::new();
        gateway.push_rows(int_rows(&rows));
        let mut store = InMemoryStateStore::new();
        let clock = ManualClock::at(0.0);
        let mut probe =
            Probe::new(Catalog::builtin(), "sql01", &mut gateway, &mut store, &clock);

        let err = probe
            .check(
                Mode::LogCacheHit,
                &databases(&["idle"]),
                &RangeSpecs::new(Some("~:95"), Some("~:99")),
                Duration::ZERO,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Query(_)), "rows {rows:?}");
    }
}
