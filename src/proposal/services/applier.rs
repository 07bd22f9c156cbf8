//! Applies approved proposals through the repository gateway.
//!
//! Edits are written one at a time in proposal order. A failing edit is
//! recorded on the proposal and the remaining edits still run, so a
//! proposal commits when at least one edit lands.

use crate::proposal::{
    domain::{
        AutomationRunLog, ChangeProposal, EditAction, FileEdit, ProposalDomainError, ProposalId,
        RunLogEntry, RunTrigger,
    },
    ports::{ProposalRepository, ProposalRepositoryError, RunLogRepository, RunLogRepositoryError},
};
use crate::repository::{
    domain::{CommitId, RepositoryLocator},
    ports::{GatewayResult, RepositoryGateway},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Failure of a single edit during application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    /// Path of the failed edit.
    pub path: String,
    /// Rendered gateway error.
    pub error: String,
}

/// Result of applying a proposal that committed at least one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The proposal after finalization.
    pub proposal: ChangeProposal,
    /// Paths written successfully, in proposal order.
    pub committed_files: Vec<String>,
    /// Newest commit created by the application.
    pub last_commit_id: CommitId,
    /// Edits that failed, in proposal order.
    pub failures: Vec<EditFailure>,
}

/// Errors returned by [`ChangeApplier::apply`].
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The proposal does not exist.
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    /// The proposal cannot be applied in its current state.
    #[error(transparent)]
    Domain(#[from] ProposalDomainError),

    /// Proposal persistence failed or detected a concurrent writer.
    #[error(transparent)]
    Store(#[from] ProposalRepositoryError),

    /// The run log could not be appended.
    #[error(transparent)]
    RunLog(#[from] RunLogRepositoryError),

    /// Every edit failed; the proposal is back to `pending`.
    #[error("no edit of proposal {id} could be applied: {detail}")]
    NothingCommitted {
        /// Proposal identifier.
        id: ProposalId,
        /// Aggregate failure detail.
        detail: String,
    },

    /// Edits were attempted and logged but the proposal could not be
    /// persisted afterwards.
    #[error("proposal {id} could not be finalized: {source}")]
    Finalize {
        /// Proposal identifier.
        id: ProposalId,
        /// Store failure.
        source: ProposalRepositoryError,
    },
}

impl ApplyError {
    /// Returns whether the failed application already appended its run
    /// log entry.
    #[must_use]
    pub const fn run_logged(&self) -> bool {
        matches!(self, Self::NothingCommitted { .. } | Self::Finalize { .. })
    }
}

/// Result type for proposal application.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Writes proposal edits and finalizes the proposal.
#[derive(Clone)]
pub struct ChangeApplier<P, L, G, C>
where
    P: ProposalRepository,
    L: RunLogRepository,
    G: RepositoryGateway,
    C: Clock + Send + Sync,
{
    proposals: Arc<P>,
    run_logs: Arc<L>,
    gateway: Arc<G>,
    clock: Arc<C>,
}

impl<P, L, G, C> ChangeApplier<P, L, G, C>
where
    P: ProposalRepository,
    L: RunLogRepository,
    G: RepositoryGateway,
    C: Clock + Send + Sync,
{
    /// Creates a new applier.
    #[must_use]
    pub const fn new(proposals: Arc<P>, run_logs: Arc<L>, gateway: Arc<G>, clock: Arc<C>) -> Self {
        Self {
            proposals,
            run_logs,
            gateway,
            clock,
        }
    }

    /// Applies every edit of a proposal to `locator`.
    ///
    /// The proposal is claimed before any write, so a concurrent claim by
    /// another writer fails here without touching the repository. Exactly
    /// one run log entry is appended once edits have been attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::Domain`] when the proposal is already committed
    /// or rejected, [`ApplyError::Store`] on a concurrent modification,
    /// [`ApplyError::NothingCommitted`] when every edit failed, and
    /// [`ApplyError::Finalize`] when the outcome cannot be persisted.
    pub async fn apply(
        &self,
        proposal_id: ProposalId,
        locator: &RepositoryLocator,
        trigger: RunTrigger,
    ) -> ApplyResult<ApplyOutcome> {
        let mut proposal = self
            .proposals
            .find_by_id(proposal_id)
            .await?
            .ok_or(ApplyError::NotFound(proposal_id))?;
        let loaded_revision = proposal.revision();
        proposal.begin_apply(&*self.clock)?;
        self.proposals.update(&proposal, loaded_revision).await?;
        let claimed_revision = proposal.revision();

        info!(
            proposal_id = %proposal_id,
            repository = %locator,
            edits = proposal.edits().len(),
            "applying change proposal"
        );

        let mut committed_files = Vec::new();
        let mut failures = Vec::new();
        let mut last_commit_id = None;
        for edit in proposal.edits() {
            match self
                .apply_edit(locator, edit, proposal.commit_message())
                .await
            {
                Ok(commit_id) => {
                    committed_files.push(edit.path().to_owned());
                    last_commit_id = Some(commit_id);
                }
                Err(err) => {
                    warn!(
                        proposal_id = %proposal_id,
                        path = edit.path(),
                        error = %err,
                        "file edit failed; continuing with remaining edits"
                    );
                    failures.push(EditFailure {
                        path: edit.path().to_owned(),
                        error: err.to_string(),
                    });
                }
            }
        }

        for failure in &failures {
            proposal.record_edit_failure(&failure.path, failure.error.clone())?;
        }

        let entry = RunLogEntry::new(proposal.repository_id(), trigger)
            .with_proposal(proposal_id)
            .with_commit(last_commit_id.clone())
            .with_commit_message(proposal.commit_message())
            .with_files(committed_files.clone())
            .with_analysis(analysis(&proposal, &failures));

        let Some(commit_id) = last_commit_id else {
            let detail = aggregate_failure(&failures);
            proposal.mark_apply_failed(detail.clone(), &*self.clock)?;
            let run_log = entry.failed(detail.clone(), &*self.clock);
            self.finalize(&proposal, claimed_revision, &run_log).await?;
            return Err(ApplyError::NothingCommitted {
                id: proposal_id,
                detail,
            });
        };

        proposal.mark_committed(commit_id.clone(), &*self.clock)?;
        let run_log = entry.succeeded(&*self.clock);
        self.finalize(&proposal, claimed_revision, &run_log).await?;

        info!(
            proposal_id = %proposal_id,
            committed = committed_files.len(),
            failed = failures.len(),
            commit_id = %commit_id,
            "change proposal committed"
        );

        Ok(ApplyOutcome {
            proposal,
            committed_files,
            last_commit_id: commit_id,
            failures,
        })
    }

    async fn apply_edit(
        &self,
        locator: &RepositoryLocator,
        edit: &FileEdit,
        message: &str,
    ) -> GatewayResult<CommitId> {
        match edit.action() {
            EditAction::Create => {
                let receipt = self
                    .gateway
                    .write_file(locator, edit.path(), edit.after(), message, None)
                    .await?;
                Ok(receipt.commit_id)
            }
            EditAction::Update => {
                let current = self.gateway.read_file(locator, edit.path()).await?;
                let receipt = self
                    .gateway
                    .write_file(
                        locator,
                        edit.path(),
                        edit.after(),
                        message,
                        Some(&current.token),
                    )
                    .await?;
                Ok(receipt.commit_id)
            }
            EditAction::Delete => {
                let current = self.gateway.read_file(locator, edit.path()).await?;
                self.gateway
                    .delete_file(locator, edit.path(), message, &current.token)
                    .await
            }
        }
    }

    /// Persists the finalized proposal and appends its run log.
    ///
    /// The run log is appended even when the proposal update fails, since
    /// the edits it describes already reached the repository.
    async fn finalize(
        &self,
        proposal: &ChangeProposal,
        claimed_revision: u64,
        run_log: &AutomationRunLog,
    ) -> ApplyResult<()> {
        let persisted = self.proposals.update(proposal, claimed_revision).await;
        self.run_logs.append(run_log).await?;
        persisted.map_err(|source| ApplyError::Finalize {
            id: proposal.id(),
            source,
        })
    }
}

fn analysis(proposal: &ChangeProposal, failures: &[EditFailure]) -> String {
    if failures.is_empty() {
        return proposal.explanation().to_owned();
    }
    let failed: Vec<&str> = failures.iter().map(|failure| failure.path.as_str()).collect();
    format!(
        "{} (failed edits: {})",
        proposal.explanation(),
        failed.join(", ")
    )
}

fn aggregate_failure(failures: &[EditFailure]) -> String {
    let details: Vec<String> = failures
        .iter()
        .map(|failure| format!("{}: {}", failure.path, failure.error))
        .collect();
    format!("all {} edits failed: {}", failures.len(), details.join("; "))
}
