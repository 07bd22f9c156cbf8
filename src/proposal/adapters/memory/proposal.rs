//! In-memory proposal repository for tests and local runs.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::proposal::{
    domain::{ChangeProposal, ProposalId, ProposalStatus, UserId},
    ports::{ProposalRepository, ProposalRepositoryError, ProposalRepositoryResult},
};
use crate::repository::domain::RepositoryId;

/// Thread-safe in-memory proposal repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProposalRepository {
    state: Arc<RwLock<HashMap<ProposalId, ChangeProposal>>>,
}

impl InMemoryProposalRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> ProposalRepositoryError {
    ProposalRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn newest_first(mut proposals: Vec<ChangeProposal>) -> Vec<ChangeProposal> {
    proposals.sort_by_key(|proposal| Reverse(proposal.created_at()));
    proposals
}

#[async_trait]
impl ProposalRepository for InMemoryProposalRepository {
    async fn store(&self, proposal: &ChangeProposal) -> ProposalRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.contains_key(&proposal.id()) {
            return Err(ProposalRepositoryError::DuplicateProposal(proposal.id()));
        }
        state.insert(proposal.id(), proposal.clone());
        Ok(())
    }

    async fn update(
        &self,
        proposal: &ChangeProposal,
        expected_revision: u64,
    ) -> ProposalRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .get_mut(&proposal.id())
            .ok_or(ProposalRepositoryError::NotFound(proposal.id()))?;
        if stored.status().is_terminal() {
            return Err(ProposalRepositoryError::Finalized(proposal.id()));
        }
        if stored.revision() != expected_revision {
            return Err(ProposalRepositoryError::RevisionConflict {
                id: proposal.id(),
                expected: expected_revision,
            });
        }
        *stored = proposal.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: ProposalId) -> ProposalRepositoryResult<Option<ChangeProposal>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(&id).cloned())
    }

    async fn find_by_repository(
        &self,
        repository_id: RepositoryId,
        status: Option<ProposalStatus>,
    ) -> ProposalRepositoryResult<Vec<ChangeProposal>> {
        let state = self.state.read().map_err(poisoned)?;
        let matching = state
            .values()
            .filter(|proposal| proposal.repository_id() == repository_id)
            .filter(|proposal| status.is_none_or(|wanted| proposal.status() == wanted))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn find_by_user(&self, user_id: UserId) -> ProposalRepositoryResult<Vec<ChangeProposal>> {
        let state = self.state.read().map_err(poisoned)?;
        let matching = state
            .values()
            .filter(|proposal| proposal.user_id() == Some(user_id))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }
}
