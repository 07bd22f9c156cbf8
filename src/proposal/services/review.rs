//! Review operations over stored proposals.

use crate::proposal::{
    domain::{ChangeProposal, ProposalId, ProposalStatus, UserId},
    ports::{ProposalRepository, ProposalRepositoryError},
};
use crate::repository::domain::RepositoryId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors returned by proposal review operations.
#[derive(Debug, Error)]
pub enum ProposalReviewError {
    /// The proposal does not exist.
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    /// Persistence failed or detected a concurrent writer.
    #[error(transparent)]
    Store(#[from] ProposalRepositoryError),
}

/// Result type for proposal review operations.
pub type ProposalReviewResult<T> = Result<T, ProposalReviewError>;

/// Lookup and rejection of change proposals.
#[derive(Clone)]
pub struct ProposalReviewService<P, C>
where
    P: ProposalRepository,
    C: Clock + Send + Sync,
{
    proposals: Arc<P>,
    clock: Arc<C>,
}

impl<P, C> ProposalReviewService<P, C>
where
    P: ProposalRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new review service.
    #[must_use]
    pub const fn new(proposals: Arc<P>, clock: Arc<C>) -> Self {
        Self { proposals, clock }
    }

    /// Finds a proposal by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalReviewError::Store`] when the lookup fails.
    pub async fn find(&self, id: ProposalId) -> ProposalReviewResult<Option<ChangeProposal>> {
        Ok(self.proposals.find_by_id(id).await?)
    }

    /// Rejects a proposal.
    ///
    /// Rejecting a committed or rejected proposal returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalReviewError::NotFound`] for an unknown proposal and
    /// [`ProposalReviewError::Store`] when another writer changed it first.
    pub async fn reject(&self, id: ProposalId) -> ProposalReviewResult<ChangeProposal> {
        let mut proposal = self
            .proposals
            .find_by_id(id)
            .await?
            .ok_or(ProposalReviewError::NotFound(id))?;
        let loaded_revision = proposal.revision();
        if proposal.reject(&*self.clock) {
            self.proposals.update(&proposal, loaded_revision).await?;
            info!(proposal_id = %id, "change proposal rejected");
        }
        Ok(proposal)
    }

    /// Returns every pending proposal of a repository, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalReviewError::Store`] when the query fails.
    pub async fn list_pending(
        &self,
        repository_id: RepositoryId,
    ) -> ProposalReviewResult<Vec<ChangeProposal>> {
        Ok(self.proposals.find_pending(repository_id).await?)
    }

    /// Returns proposals of a repository, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalReviewError::Store`] when the query fails.
    pub async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
        status: Option<ProposalStatus>,
    ) -> ProposalReviewResult<Vec<ChangeProposal>> {
        Ok(self
            .proposals
            .find_by_repository(repository_id, status)
            .await?)
    }

    /// Returns proposals submitted by a user.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalReviewError::Store`] when the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> ProposalReviewResult<Vec<ChangeProposal>> {
        Ok(self.proposals.find_by_user(user_id).await?)
    }
}
