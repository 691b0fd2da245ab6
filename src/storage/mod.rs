//! Persistence for rate-of-change baselines.
//!
//! Each probe run is a fresh process, so the previous counter reading has to
//! survive on disk between invocations. This module provides the store
//! interface and its file and in-memory implementations.

pub mod backend;
pub mod file;
pub mod memory;

// Re-export commonly used types
pub use backend::{PersistedSample, SampleKey, StateStore};
pub use file::FileStateStore;
pub use memory::InMemoryStateStore;
