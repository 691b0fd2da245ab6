//! Database access.
//!
//! The metric strategies only need to run a query and read back rows of
//! scalar cells. [`Gateway`] is that seam; [`MssqlGateway`] implements it over
//! TDS and [`ScriptedGateway`] replays canned results.

pub mod mssql;
pub mod scripted;

use crate::core::{ProbeError, Result};
use std::fmt;

pub use mssql::{ConnectionSettings, MssqlGateway};
pub use scripted::ScriptedGateway;

/// One scalar value from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// SQL NULL
    Null,
    /// `bit`
    Bool(bool),
    /// Any integer column
    Int(i64),
    /// `real`, `float`, `decimal` and `numeric`
    Float(f64),
    /// Character data
    Text(String),
    /// A column type the probe does not interpret, kept for error messages
    Other(String),
}

/// A result row: cells in column order.
pub type Row = Vec<Cell>;

impl Cell {
    /// Numeric value of the cell. Text is accepted when it parses as a number.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Cell::Int(v) => Ok(*v as f64),
            Cell::Float(v) => Ok(*v),
            Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ProbeError::query(format!("Expected a number, got '{}'", s))),
            Cell::Null => Err(ProbeError::query("Expected a number, got NULL")),
            Cell::Other(desc) => Err(ProbeError::query(format!("Expected a number, got {}", desc))),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Other(desc) => f.write_str(desc),
        }
    }
}

/// Executes queries against the monitored server.
///
/// Any error is fatal for the invocation; nothing is retried.
#[async_trait::async_trait]
pub trait Gateway: Send {
    /// Run `query` and return every row of its first result set.
    async fn execute(&mut self, query: &str) -> Result<Vec<Row>>;
}
