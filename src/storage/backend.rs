//! State store trait and the record it persists.

use crate::core::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Last observation of a rate-of-change counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedSample {
    /// Seconds since the Unix epoch
    pub time: f64,
    /// Raw counter value, before any modifier
    pub value: f64,
}

/// Identity of a persisted sample.
///
/// A hex SHA-256 over host, database and query text, so the same check
/// finds its record again in the next process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey(String);

impl SampleKey {
    /// Derive the key for a (host, database, query) triple.
    pub fn derive(host: &str, database: &str, query: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(host.as_bytes());
        hasher.update([0u8]);
        hasher.update(database.as_bytes());
        hasher.update([0u8]);
        hasher.update(query.as_bytes());
        SampleKey(hex::encode(hasher.finalize()))
    }

    /// Returns the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable key-value association for rate-of-change samples.
///
/// Loading never fails: a missing or unreadable record is reported as
/// `None` and the caller starts a fresh baseline. There is no locking;
/// when two probes write the same key the last writer wins.
pub trait StateStore {
    /// Fetch the last sample stored under `key`.
    fn load(&self, key: &SampleKey) -> Option<PersistedSample>;

    /// Replace the sample stored under `key`.
    fn store(&mut self, key: &SampleKey, sample: PersistedSample) -> Result<()>;
}
