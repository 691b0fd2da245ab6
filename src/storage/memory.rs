//! In-memory state store.
//!
//! Lives only as long as the process, so it is useful for tests and for
//! dry runs that must not disturb the on-disk baselines.

use super::backend::{PersistedSample, SampleKey, StateStore};
use crate::core::Result;
use std::collections::HashMap;

/// State store backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    samples: HashMap<SampleKey, PersistedSample>,
}

impl InMemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self, key: &SampleKey) -> Option<PersistedSample> {
        self.samples.get(key).copied()
    }

    fn store(&mut self, key: &SampleKey, sample: PersistedSample) -> Result<()> {
        self.samples.insert(key.clone(), sample);
        Ok(())
    }
}
