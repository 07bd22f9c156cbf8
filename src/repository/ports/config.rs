//! Repository port for automation configuration persistence.

use crate::repository::domain::{RepositoryAutomationConfig, RepositoryFullName, RepositoryId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration repository operations.
pub type AutomationConfigRepositoryResult<T> = Result<T, AutomationConfigRepositoryError>;

/// Automation configuration persistence contract.
#[async_trait]
pub trait AutomationConfigRepository: Send + Sync {
    /// Stores a newly connected repository.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationConfigRepositoryError::DuplicateRepository`] when
    /// the `owner/repo` name is already connected.
    async fn store(&self, config: &RepositoryAutomationConfig)
    -> AutomationConfigRepositoryResult<()>;

    /// Persists changes to an existing configuration loaded at
    /// `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationConfigRepositoryError::NotFound`] when the
    /// configuration does not exist and
    /// [`AutomationConfigRepositoryError::RevisionConflict`] when another
    /// writer changed it since it was loaded.
    async fn update(
        &self,
        config: &RepositoryAutomationConfig,
        expected_revision: u64,
    ) -> AutomationConfigRepositoryResult<()>;

    /// Stamps the completion time of a successful run, leaving every
    /// other field and the revision untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationConfigRepositoryError::NotFound`] when the
    /// configuration does not exist.
    async fn record_last_run(
        &self,
        id: RepositoryId,
        completed_at: DateTime<Utc>,
    ) -> AutomationConfigRepositoryResult<()>;

    /// Deletes a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationConfigRepositoryError::NotFound`] when the
    /// configuration does not exist.
    async fn delete(&self, id: RepositoryId) -> AutomationConfigRepositoryResult<()>;

    /// Finds a configuration by identifier.
    async fn find_by_id(
        &self,
        id: RepositoryId,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>>;

    /// Finds a configuration by `owner/repo` name.
    async fn find_by_full_name(
        &self,
        full_name: &RepositoryFullName,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>>;

    /// Returns every configuration with automation enabled.
    async fn list_enabled(
        &self,
    ) -> AutomationConfigRepositoryResult<Vec<RepositoryAutomationConfig>>;
}

/// Errors returned by configuration repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AutomationConfigRepositoryError {
    /// The repository is already connected.
    #[error("repository already connected: {0}")]
    DuplicateRepository(RepositoryFullName),

    /// The configuration was not found.
    #[error("repository not found: {0}")]
    NotFound(RepositoryId),

    /// Another writer updated the configuration first.
    #[error("repository {id} was modified concurrently (expected revision {expected})")]
    RevisionConflict {
        /// Repository identifier.
        id: RepositoryId,
        /// Revision the caller loaded.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AutomationConfigRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
