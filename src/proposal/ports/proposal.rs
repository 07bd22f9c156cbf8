//! Repository port for change proposal persistence.

use crate::proposal::domain::{ChangeProposal, ProposalId, ProposalStatus, UserId};
use crate::repository::domain::RepositoryId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for proposal repository operations.
pub type ProposalRepositoryResult<T> = Result<T, ProposalRepositoryError>;

/// Change proposal persistence contract.
///
/// Updates are optimistic: the caller passes the revision it loaded and
/// the write fails when the stored row has moved on or is already final.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Stores a new proposal.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalRepositoryError::DuplicateProposal`] when the
    /// identifier already exists.
    async fn store(&self, proposal: &ChangeProposal) -> ProposalRepositoryResult<()>;

    /// Replaces a stored proposal whose revision equals `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalRepositoryError::NotFound`] for an unknown proposal,
    /// [`ProposalRepositoryError::Finalized`] when the stored proposal is
    /// committed or rejected, and [`ProposalRepositoryError::RevisionConflict`]
    /// when another writer updated it first.
    async fn update(
        &self,
        proposal: &ChangeProposal,
        expected_revision: u64,
    ) -> ProposalRepositoryResult<()>;

    /// Finds a proposal by identifier.
    async fn find_by_id(&self, id: ProposalId) -> ProposalRepositoryResult<Option<ChangeProposal>>;

    /// Returns proposals of a repository, newest first, optionally filtered
    /// by status.
    async fn find_by_repository(
        &self,
        repository_id: RepositoryId,
        status: Option<ProposalStatus>,
    ) -> ProposalRepositoryResult<Vec<ChangeProposal>>;

    /// Returns proposals submitted by a user, newest first.
    async fn find_by_user(&self, user_id: UserId) -> ProposalRepositoryResult<Vec<ChangeProposal>>;

    /// Returns every pending proposal of a repository, newest first.
    async fn find_pending(
        &self,
        repository_id: RepositoryId,
    ) -> ProposalRepositoryResult<Vec<ChangeProposal>> {
        self.find_by_repository(repository_id, Some(ProposalStatus::Pending))
            .await
    }
}

/// Errors returned by proposal repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProposalRepositoryError {
    /// A proposal with the same identifier already exists.
    #[error("duplicate proposal identifier: {0}")]
    DuplicateProposal(ProposalId),

    /// The proposal was not found.
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    /// The stored proposal is committed or rejected.
    #[error("proposal {0} is finalized and cannot change")]
    Finalized(ProposalId),

    /// Another writer updated the proposal first.
    #[error("proposal {id} was modified concurrently (expected revision {expected})")]
    RevisionConflict {
        /// Proposal identifier.
        id: ProposalId,
        /// Revision the caller loaded.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProposalRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
