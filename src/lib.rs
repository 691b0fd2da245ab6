//! mssqlprobe - Nagios-compatible SQL Server database check.
//!
//! Reads SQL Server performance counters for one or more databases,
//! compares them against Nagios threshold ranges and prints the classic
//! plugin status line with performance data.
//!
//! # Features
//!
//! - **Nagios ranges**: `N`, `N:`, `~:N`, `N:M` and `@N:M`
//! - **Three metric strategies**: plain values, ratios of two counters and
//!   per-second rates between runs
//! - **Persistent baselines**: rate-of-change samples survive between
//!   invocations in small JSON state files
//!
//! # Architecture
//!
//! - `threshold`: range parser and evaluator
//! - `metrics`: mode catalog and metric strategies
//! - `storage`: rate-of-change state stores
//! - `gateway`: query execution against the server
//! - `probe` / `report`: check orchestration and output
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use mssqlprobe_lib::cli::{self, Cli, Invocation};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     if let Invocation::Run(cli) = Cli::parse_args() {
//!         let report = cli::execute(*cli).await;
//!         println!("{}", report.output);
//!         std::process::exit(report.exit_code());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod gateway;
pub mod metrics;
pub mod probe;
pub mod report;
pub mod storage;
pub mod threshold;

// Re-export core types for convenience
pub use crate::core::{Config, ProbeError, Result, ServiceState};
pub use crate::report::Report;
