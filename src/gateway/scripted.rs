//! Gateway that replays canned results.

use super::{Gateway, Row};
use crate::core::{ProbeError, Result};
use std::collections::VecDeque;

/// Replays queued responses in order and records every query it was given.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    responses: VecDeque<Result<Vec<Row>>>,
    executed: Vec<String>,
}

impl ScriptedGateway {
    /// Create a gateway with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next query.
    pub fn push_rows(&mut self, rows: Vec<Row>) -> &mut Self {
        self.responses.push_back(Ok(rows));
        self
    }

    /// Queue a failure for the next query.
    pub fn push_error(&mut self, error: ProbeError) -> &mut Self {
        self.responses.push_back(Err(error));
        self
    }

    /// Queries executed so far.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }
}

#[async_trait::async_trait]
impl Gateway for ScriptedGateway {
    async fn execute(&mut self, query: &str) -> Result<Vec<Row>> {
        self.executed.push(query.to_string());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::query(format!("No scripted response for: {}", query))))
    }
}
