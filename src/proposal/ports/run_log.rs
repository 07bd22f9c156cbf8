//! Repository port for the append-only run log.

use crate::proposal::domain::{AutomationRunLog, RunLogId};
use crate::repository::domain::RepositoryId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for run log operations.
pub type RunLogRepositoryResult<T> = Result<T, RunLogRepositoryError>;

/// Append-only run log contract.
#[async_trait]
pub trait RunLogRepository: Send + Sync {
    /// Appends a run record.
    ///
    /// # Errors
    ///
    /// Returns [`RunLogRepositoryError::DuplicateRunLog`] when the identifier
    /// already exists.
    async fn append(&self, log: &AutomationRunLog) -> RunLogRepositoryResult<()>;

    /// Returns up to `limit` runs of a repository, newest first.
    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
        limit: usize,
    ) -> RunLogRepositoryResult<Vec<AutomationRunLog>>;
}

/// Errors returned by run log implementations.
#[derive(Debug, Clone, Error)]
pub enum RunLogRepositoryError {
    /// A run with the same identifier already exists.
    #[error("duplicate run log identifier: {0}")]
    DuplicateRunLog(RunLogId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunLogRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
