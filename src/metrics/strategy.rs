//! Turning query results into metric samples.
//!
//! Three strategies, dispatched through [`evaluate`]:
//! - `Standard`: the single value returned, times the modifier
//! - `Ratio`: first row divided by second row, times the modifier
//! - `RateOfChange`: change since the previous run divided by the elapsed
//!   seconds, times the modifier. The previous reading comes from the
//!   [`StateStore`].

use crate::core::{MetricSample, ProbeError, Result};
use crate::gateway::{Gateway, Row};
use crate::storage::{PersistedSample, SampleKey, StateStore};

use super::catalog::{Mode, ModeSpec};

/// How a raw query result becomes a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Single scalar
    Standard,
    /// Quotient of exactly two rows
    Ratio,
    /// Per-second delta against the persisted previous reading
    RateOfChange,
}

/// Source of wall-clock time, in seconds since the Unix epoch.
pub trait Clock {
    /// Current time.
    fn now(&self) -> f64;
}

/// Clock reading the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// One thing to measure on one database.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRequest {
    /// Mode being evaluated
    pub mode: Mode,
    /// Target database
    pub database: String,
    /// Server identity, part of the rate-of-change key
    pub host: String,
    /// Rendered query text
    pub query: String,
    /// Multiplier applied last
    pub modifier: f64,
    /// Computation strategy
    pub strategy: Strategy,
}

impl MetricRequest {
    /// Build the request for `database` from a catalog entry.
    pub fn new(spec: &ModeSpec, host: &str, database: &str) -> Result<Self> {
        Ok(Self {
            mode: spec.mode,
            database: database.to_string(),
            host: host.to_string(),
            query: spec.query_for(database)?,
            modifier: spec.modifier,
            strategy: spec.strategy,
        })
    }

    /// Key under which a rate-of-change baseline is stored.
    pub fn sample_key(&self) -> SampleKey {
        SampleKey::derive(&self.host, &self.database, &self.query)
    }
}

/// Collaborators needed to evaluate a request.
pub struct EvalContext<'a> {
    /// Database access
    pub gateway: &'a mut dyn Gateway,
    /// Rate-of-change baselines
    pub store: &'a mut dyn StateStore,
    /// Time source for baselines
    pub clock: &'a dyn Clock,
}

/// Run the request's query and compute its sample.
pub async fn evaluate(request: &MetricRequest, ctx: &mut EvalContext<'_>) -> Result<MetricSample> {
    let rows = ctx.gateway.execute(&request.query).await?;
    tracing::debug!(
        mode = %request.mode,
        database = %request.database,
        rows = rows.len(),
        "Query returned"
    );

    match request.strategy {
        Strategy::Standard => standard(&rows, request.modifier).map(MetricSample::Value),
        Strategy::Ratio => ratio(&rows, request.modifier).map(MetricSample::Value),
        Strategy::RateOfChange => {
            let raw = first_value(&rows)?;
            let key = request.sample_key();
            let current = PersistedSample {
                time: ctx.clock.now(),
                value: raw,
            };
            let previous = ctx.store.load(&key);
            // Always leave a baseline for the next run, even when this one
            // cannot produce a rate.
            ctx.store.store(&key, current)?;
            rate(&key, previous, current, request.modifier)
        },
    }
}

/// `raw * modifier` from the first cell of the first row.
pub fn standard(rows: &[Row], modifier: f64) -> Result<f64> {
    Ok(first_value(rows)? * modifier)
}

/// `(first / second) * modifier` from the first cell of exactly two rows.
///
/// A zero divisor is a query error: an idle counter has no meaningful ratio.
pub fn ratio(rows: &[Row], modifier: f64) -> Result<f64> {
    let [numerator, divisor] = rows else {
        return Err(ProbeError::query(format!(
            "Expected exactly 2 rows for a ratio, got {}",
            rows.len()
        )));
    };
    let numerator = first_cell(numerator)?;
    let divisor = first_cell(divisor)?;
    if divisor == 0.0 {
        return Err(ProbeError::query(format!(
            "Ratio divisor is zero (numerator {})",
            numerator
        )));
    }
    let value = (numerator / divisor) * modifier;
    if !value.is_finite() {
        return Err(ProbeError::query(format!(
            "Ratio {} / {} is not a finite number",
            numerator, divisor
        )));
    }
    Ok(value)
}

/// Per-second change between `previous` and `current`.
///
/// No previous sample gives [`MetricSample::Pending`]. Samples that are not
/// strictly ordered in time fail with [`ProbeError::ZeroTimeDelta`].
pub fn rate(
    key: &SampleKey,
    previous: Option<PersistedSample>,
    current: PersistedSample,
    modifier: f64,
) -> Result<MetricSample> {
    let Some(previous) = previous else {
        tracing::info!(%key, "No baseline yet, rate available on the next run");
        return Ok(MetricSample::Pending);
    };

    let elapsed = current.time - previous.time;
    if elapsed <= 0.0 {
        return Err(ProbeError::ZeroTimeDelta {
            key: key.to_string(),
            time: previous.time,
        });
    }

    Ok(MetricSample::Value(
        ((current.value - previous.value) / elapsed) * modifier,
    ))
}

fn first_value(rows: &[Row]) -> Result<f64> {
    let row = rows
        .first()
        .ok_or_else(|| ProbeError::query("Query returned no rows"))?;
    first_cell(row)
}

fn first_cell(row: &Row) -> Result<f64> {
    row.first()
        .ok_or_else(|| ProbeError::query("Query returned an empty row"))?
        .as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Cell, ScriptedGateway};
    use crate::metrics::Catalog;
    use crate::storage::InMemoryStateStore;

    struct FixedClock(f64);

    impl Clock for FixedClock {
        fn now(&self) -> f64 {
            self.0
        }
    }

    fn rows(values: &[i64]) -> Vec<Row> {
        values.iter().map(|v| vec![Cell::Int(*v)]).collect()
    }

    fn request(mode: Mode) -> MetricRequest {
        let spec = Catalog::builtin().get(mode).unwrap();
        MetricRequest::new(spec, "sql01", "orders").unwrap()
    }

    #[test]
    fn test_standard_applies_modifier() {
        assert_eq!(standard(&rows(&[7]), 1.0).unwrap(), 7.0);
        assert_eq!(standard(&rows(&[7]), 2.5).unwrap(), 17.5);
    }

    #[test]
    fn test_standard_without_rows() {
        assert!(standard(&[], 1.0).is_err());
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(&rows(&[40, 80]), 100.0).unwrap(), 50.0);
    }

    #[test]
    fn test_ratio_zero_divisor() {
        for values in [[0, 0], [5, 0]] {
            let err = ratio(&rows(&values), 100.0).unwrap_err();
            assert!(matches!(err, ProbeError::Query(_)), "{values:?}");
        }
    }

    #[test]
    fn test_ratio_non_finite_result() {
        let huge = vec![vec![Cell::Float(f64::MAX)], vec![Cell::Float(0.5)]];
        assert!(matches!(ratio(&huge, 100.0), Err(ProbeError::Query(_))));
    }

    #[test]
    fn test_ratio_needs_two_rows() {
        assert!(ratio(&rows(&[40]), 100.0).is_err());
        assert!(ratio(&rows(&[40, 80, 1]), 100.0).is_err());
    }

    #[test]
    fn test_rate_first_run_pending() {
        let key = SampleKey::derive("h", "d", "q");
        let current = PersistedSample { time: 10.0, value: 100.0 };
        assert_eq!(rate(&key, None, current, 1.0).unwrap(), MetricSample::Pending);
    }

    #[test]
    fn test_rate_per_second() {
        let key = SampleKey::derive("h", "d", "q");
        let previous = PersistedSample { time: 10.0, value: 100.0 };
        let current = PersistedSample { time: 20.0, value: 150.0 };
        assert_eq!(
            rate(&key, Some(previous), current, 2.0).unwrap(),
            MetricSample::Value(10.0)
        );
    }

    #[test]
    fn test_rate_zero_elapsed() {
        let key = SampleKey::derive("h", "d", "q");
        let sample = PersistedSample { time: 10.0, value: 100.0 };
        let err = rate(&key, Some(sample), sample, 1.0).unwrap_err();
        assert!(matches!(err, ProbeError::ZeroTimeDelta { .. }));
    }

    #[tokio::test]
    async fn test_evaluate_rate_of_change_across_runs() {
        let mut gateway = ScriptedGateway::new();
        gateway.push_rows(rows(&[100])).push_rows(rows(&[150]));
        let mut store = InMemoryStateStore::new();
        let request = request(Mode::TransactionsPerSecond);

        let first = {
            let clock = FixedClock(1_000.0);
            let mut ctx = EvalContext {
                gateway: &mut gateway,
                store: &mut store,
                clock: &clock,
            };
            evaluate(&request, &mut ctx).await.unwrap()
        };
        assert_eq!(first, MetricSample::Pending);
        assert_eq!(
            store.load(&request.sample_key()),
            Some(PersistedSample { time: 1_000.0, value: 100.0 })
        );

        let second = {
            let clock = FixedClock(1_010.0);
            let mut ctx = EvalContext {
                gateway: &mut gateway,
                store: &mut store,
                clock: &clock,
            };
            evaluate(&request, &mut ctx).await.unwrap()
        };
        assert_eq!(second, MetricSample::Value(5.0));
    }

    #[tokio::test]
    async fn test_zero_delta_still_persists() {
        let mut gateway = ScriptedGateway::new();
        gateway.push_rows(rows(&[120]));
        let mut store = InMemoryStateStore::new();
        let request = request(Mode::LogFlushes);
        store
            .store(&request.sample_key(), PersistedSample { time: 50.0, value: 100.0 })
            .unwrap();

        let clock = FixedClock(50.0);
        let mut ctx = EvalContext {
            gateway: &mut gateway,
            store: &mut store,
            clock: &clock,
        };
        let err = evaluate(&request, &mut ctx).await.unwrap_err();
        assert!(matches!(err, ProbeError::ZeroTimeDelta { .. }));
        assert_eq!(
            store.load(&request.sample_key()),
            Some(PersistedSample { time: 50.0, value: 120.0 })
        );
    }

    #[tokio::test]
    async fn test_evaluate_ratio_mode() {
        let mut gateway = ScriptedGateway::new();
        gateway.push_rows(rows(&[40, 80]));
        let mut store = InMemoryStateStore::new();
        let clock = SystemClock;
        let mut ctx = EvalContext {
            gateway: &mut gateway,
            store: &mut store,
            clock: &clock,
        };

        let sample = evaluate(&request(Mode::LogCacheHit), &mut ctx).await.unwrap();
        assert_eq!(sample, MetricSample::Value(50.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_request_key_tracks_query() {
        let a = request(Mode::LogFlushes);
        let b = request(Mode::TransactionsPerSecond);
        assert_ne!(a.sample_key(), b.sample_key());
    }
}
