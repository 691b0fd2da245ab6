//! Error types for the probe.
//!
//! Any error that reaches the top of a run becomes an UNKNOWN result whose
//! output is the error's display text.

use thiserror::Error;

/// Main error type for the probe
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Invalid options or configuration file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server unreachable or login refused; shown verbatim
    #[error("{0}")]
    Connection(String),

    /// Query failed or returned something unusable
    #[error("Query error: {0}")]
    Query(String),

    /// Malformed warning or critical range
    #[error("Improper warning/critical format: '{spec}'")]
    Format {
        /// The range as given
        spec: String,
    },

    /// Previous sample is not older than the current one
    #[error("Rate of change for {key} has no elapsed time since the previous sample at {time}")]
    ZeroTimeDelta {
        /// State key of the sample
        key: String,
        /// Timestamp of the previous sample
        time: f64,
    },

    /// State could not be persisted
    #[error("State store error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a new threshold format error
    pub fn format<S: Into<String>>(spec: S) -> Self {
        Self::Format { spec: spec.into() }
    }

    /// Creates a new state store error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::Query(_) => "query",
            Self::Format { .. } => "format",
            Self::ZeroTimeDelta { .. } => "rate",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<tiberius::error::Error> for ProbeError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Server(token) => Self::Query(token.message().to_string()),
            other => Self::Connection(other.to_string()),
        }
    }
}
