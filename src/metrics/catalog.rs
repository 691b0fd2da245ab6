//! Built-in check modes.
//!
//! Each mode bundles the performance counter it reads, how the raw reading
//! turns into a reportable number, and how the result is displayed. The
//! table is immutable and handed around as a [`Catalog`].

use super::strategy::Strategy;
use crate::core::{ProbeError, Result};
use std::fmt;

/// A named check selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Log Cache Hit Ratio
    LogCacheHit,
    /// Active Transactions
    ActiveTransactions,
    /// Log Flushes Per Second
    LogFlushes,
    /// Log File Usage
    LogFileUsage,
    /// Transactions Per Second
    TransactionsPerSecond,
    /// Log Growths
    LogGrowths,
    /// Log Shrinks
    LogShrinks,
    /// Log Truncations
    LogTruncations,
    /// Log Flush Wait Time
    LogWait,
    /// Database Size
    DataSize,
    /// Time to connect to the server
    TimeToConnect,
    /// Run every query mode and report which ones work
    SelfTest,
}

impl Mode {
    /// Command-line flag name, without the leading dashes.
    pub fn flag(self) -> &'static str {
        match self {
            Mode::LogCacheHit => "logcachehit",
            Mode::ActiveTransactions => "activetrans",
            Mode::LogFlushes => "logflushes",
            Mode::LogFileUsage => "logfileusage",
            Mode::TransactionsPerSecond => "transpec",
            Mode::LogGrowths => "loggrowths",
            Mode::LogShrinks => "logshrinks",
            Mode::LogTruncations => "logtruncs",
            Mode::LogWait => "logwait",
            Mode::DataSize => "datasize",
            Mode::TimeToConnect => "time2connect",
            Mode::SelfTest => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// How a counter name is matched in `sysperfinfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMatch {
    /// `counter_name = '<name>'`, one row
    Exact,
    /// `counter_name LIKE '<name>%'`, the counter and its `Base` divisor
    WithBase,
}

/// Query text for one performance counter, filled in per database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    /// `sysperfinfo.counter_name`
    pub counter: &'static str,
    /// Exact or prefix match
    pub matching: CounterMatch,
}

impl QueryTemplate {
    /// Render the query for `database`.
    pub fn render(&self, database: &str) -> String {
        let instance = database.replace('\'', "''");
        match self.matching {
            CounterMatch::Exact => format!(
                "SELECT cntr_value FROM sysperfinfo WHERE counter_name='{}' AND instance_name='{}';",
                self.counter, instance
            ),
            // Sorting puts the counter ahead of its "<name> Base" divisor.
            CounterMatch::WithBase => format!(
                "SELECT cntr_value FROM sysperfinfo WHERE counter_name LIKE '{}%' AND instance_name='{}' ORDER BY counter_name;",
                self.counter, instance
            ),
        }
    }
}

/// Everything the probe needs to know about one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSpec {
    /// The mode this entry describes
    pub mode: Mode,
    /// Help text for the command-line flag
    pub help: &'static str,
    /// Status text; `{database}` and `{value}` are substituted
    pub stdout: &'static str,
    /// Performance-data label, prefixed with the database name
    pub label: &'static str,
    /// Performance-data unit
    pub unit: &'static str,
    /// Counter query; `None` for modes that do not query a counter
    pub query: Option<QueryTemplate>,
    /// How the raw reading becomes a metric
    pub strategy: Strategy,
    /// Multiplier applied last
    pub modifier: f64,
}

impl ModeSpec {
    /// Status text for one database.
    ///
    /// Placeholders are substituted in one left-to-right pass, so braces in
    /// the database name or value are copied as-is.
    pub fn render_stdout(&self, database: &str, value: &str) -> String {
        let mut out = String::with_capacity(self.stdout.len() + database.len() + value.len());
        let mut rest = self.stdout;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{database}") {
                out.push_str(database);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{value}") {
                out.push_str(value);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }

    /// Performance-data label for one database.
    pub fn perf_label(&self, database: &str) -> String {
        format!("{}_{}", database, self.label)
    }

    /// Query text for `database`.
    pub fn query_for(&self, database: &str) -> Result<String> {
        self.query
            .map(|template| template.render(database))
            .ok_or_else(|| ProbeError::config(format!("Mode '{}' does not run a counter query", self.mode)))
    }
}

const fn exact(counter: &'static str) -> Option<QueryTemplate> {
    Some(QueryTemplate {
        counter,
        matching: CounterMatch::Exact,
    })
}

const fn with_base(counter: &'static str) -> Option<QueryTemplate> {
    Some(QueryTemplate {
        counter,
        matching: CounterMatch::WithBase,
    })
}

static BUILTIN_MODES: [ModeSpec; 12] = [
    ModeSpec {
        mode: Mode::LogCacheHit,
        help: "Log Cache Hit Ratio",
        stdout: "Database {database} Log Cache Hit Ratio is {value}%",
        label: "log_cache_hit_ratio",
        unit: "%",
        query: with_base("Log Cache Hit Ratio"),
        strategy: Strategy::Ratio,
        modifier: 100.0,
    },
    ModeSpec {
        mode: Mode::ActiveTransactions,
        help: "Active Transactions",
        stdout: "Database {database} Active Transactions is {value}",
        label: "active_transactions",
        unit: "",
        query: exact("Active Transactions"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogFlushes,
        help: "Log Flushes Per Second",
        stdout: "Database {database} Log Flushes Per Second is {value}/sec",
        label: "log_flushes_per_sec",
        unit: "",
        query: exact("Log Flushes/sec"),
        strategy: Strategy::RateOfChange,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogFileUsage,
        help: "Log File Usage",
        stdout: "Database {database} Log File Usage is {value}%",
        label: "log_file_usage",
        unit: "%",
        query: exact("Percent Log Used"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::TransactionsPerSecond,
        help: "Transactions Per Second",
        stdout: "Database {database} Transactions Per Second is {value}/sec",
        label: "transactions_per_sec",
        unit: "",
        query: exact("Transactions/sec"),
        strategy: Strategy::RateOfChange,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogGrowths,
        help: "Log Growths",
        stdout: "Database {database} Log Growths is {value}",
        label: "log_growths",
        unit: "",
        query: exact("Log Growths"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogShrinks,
        help: "Log Shrinks",
        stdout: "Database {database} Log Shrinks is {value}",
        label: "log_shrinks",
        unit: "",
        query: exact("Log Shrinks"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogTruncations,
        help: "Log Truncations",
        stdout: "Database {database} Log Truncations is {value}",
        label: "log_truncations",
        unit: "",
        query: exact("Log Truncations"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::LogWait,
        help: "Log Flush Wait Time",
        stdout: "Database {database} Log Flush Wait Time is {value}ms",
        label: "log_wait_time",
        unit: "ms",
        query: exact("Log Flush Wait Time"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::DataSize,
        help: "Database Size",
        stdout: "Database {database} Database size is {value}KB",
        label: "data_size",
        unit: "KB",
        query: exact("Data File(s) Size (KB)"),
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::TimeToConnect,
        help: "Time to connect to the database.",
        stdout: "Database {database} Time to connect was {value}s",
        label: "time",
        unit: "s",
        query: None,
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
    ModeSpec {
        mode: Mode::SelfTest,
        help: "Run tests of all queries against the database.",
        stdout: "",
        label: "",
        unit: "",
        query: None,
        strategy: Strategy::Standard,
        modifier: 1.0,
    },
];

/// Read-only table of modes.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    modes: &'static [ModeSpec],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The modes shipped with the probe.
    pub fn builtin() -> Self {
        Self {
            modes: &BUILTIN_MODES,
        }
    }

    /// Look up a mode.
    pub fn get(&self, mode: Mode) -> Result<&'static ModeSpec> {
        self.modes
            .iter()
            .find(|spec| spec.mode == mode)
            .ok_or_else(|| ProbeError::config(format!("Unknown mode '{}'", mode)))
    }

    /// Every mode, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static ModeSpec> {
        self.modes.iter()
    }

    /// Modes that run a counter query.
    pub fn query_modes(&self) -> impl Iterator<Item = &'static ModeSpec> {
        self.modes.iter().filter(|spec| spec.query.is_some())
    }
}
