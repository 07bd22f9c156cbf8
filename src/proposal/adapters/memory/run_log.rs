//! In-memory run log for tests and local runs.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::proposal::{
    domain::AutomationRunLog,
    ports::{RunLogRepository, RunLogRepositoryError, RunLogRepositoryResult},
};
use crate::repository::domain::RepositoryId;

/// Thread-safe in-memory run log, kept in append order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunLogRepository {
    state: Arc<RwLock<Vec<AutomationRunLog>>>,
}

impl InMemoryRunLogRepository {
    /// Creates an empty run log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> RunLogRepositoryError {
    RunLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RunLogRepository for InMemoryRunLogRepository {
    async fn append(&self, log: &AutomationRunLog) -> RunLogRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.iter().any(|existing| existing.id() == log.id()) {
            return Err(RunLogRepositoryError::DuplicateRunLog(log.id()));
        }
        state.push(log.clone());
        Ok(())
    }

    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
        limit: usize,
    ) -> RunLogRepositoryResult<Vec<AutomationRunLog>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .iter()
            .rev()
            .filter(|log| log.repository_id() == repository_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
