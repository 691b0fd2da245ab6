//! Core types shared by every part of the probe.
//!
//! Errors, configuration and the small value types that flow between the
//! metric strategies and the result aggregator.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use error::{ProbeError, Result};
pub use types::{format_value, MetricSample, ServiceState};
