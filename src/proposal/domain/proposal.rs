//! Change proposal aggregate root and its lifecycle.

use super::{FileEdit, ParseProposalValueError, ProposalDomainError, ProposalId, UserId};
use crate::repository::domain::{CommitId, RepositoryId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Proposal lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting review or application.
    Pending,
    /// Claimed for application.
    Approved,
    /// At least one edit was written.
    Committed,
    /// Discarded by a reviewer.
    Rejected,
}

impl ProposalStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }

    /// Returns whether the lifecycle permits moving to `target`.
    ///
    /// `approved` falls back to `pending` when an apply attempt writes
    /// nothing.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Approved | Self::Committed | Self::Rejected
            ) | (
                Self::Approved,
                Self::Pending | Self::Committed | Self::Rejected
            )
        )
    }
}

impl TryFrom<&str> for ProposalStatus {
    type Error = ParseProposalValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "committed" => Ok(Self::Committed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseProposalValueError::new("proposal status", value)),
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification reported by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Cosmetic or isolated change.
    Low,
    /// Behavioural change with limited reach.
    Medium,
    /// Wide-reaching or hard to reverse change.
    High,
}

impl RiskLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for RiskLevel {
    type Error = ParseProposalValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseProposalValueError::new("risk level", value)),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object describing a proposal before it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    /// Repository the edits target.
    pub repository_id: RepositoryId,
    /// Submitting user; `None` for unattended runs.
    pub user_id: Option<UserId>,
    /// Instruction the proposal answers.
    pub instruction: String,
    /// Step-by-step plan.
    pub plan: String,
    /// Free-text explanation of the change.
    pub explanation: String,
    /// Risk classification.
    pub risk: RiskLevel,
    /// Ordered file edits.
    pub edits: Vec<FileEdit>,
    /// Message used for every commit of the proposal.
    pub commit_message: String,
}

/// Change proposal aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeProposal {
    id: ProposalId,
    repository_id: RepositoryId,
    user_id: Option<UserId>,
    instruction: String,
    plan: String,
    explanation: String,
    risk: RiskLevel,
    edits: Vec<FileEdit>,
    commit_message: String,
    status: ProposalStatus,
    commit_id: Option<CommitId>,
    error_message: Option<String>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedChangeProposalData {
    /// Persisted proposal identifier.
    pub id: ProposalId,
    /// Persisted repository identifier.
    pub repository_id: RepositoryId,
    /// Persisted submitting user, if any.
    pub user_id: Option<UserId>,
    /// Persisted instruction.
    pub instruction: String,
    /// Persisted plan.
    pub plan: String,
    /// Persisted explanation.
    pub explanation: String,
    /// Persisted risk classification.
    pub risk: RiskLevel,
    /// Persisted edits.
    pub edits: Vec<FileEdit>,
    /// Persisted commit message.
    pub commit_message: String,
    /// Persisted lifecycle state.
    pub status: ProposalStatus,
    /// Persisted resulting commit, if any.
    pub commit_id: Option<CommitId>,
    /// Persisted error message, if any.
    pub error_message: Option<String>,
    /// Persisted optimistic-concurrency revision.
    pub revision: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ChangeProposal {
    /// Creates a pending proposal from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError`] when the instruction or commit
    /// message is blank, the edit set is empty, or two edits share a path.
    pub fn new(draft: ProposalDraft, clock: &impl Clock) -> Result<Self, ProposalDomainError> {
        if draft.instruction.trim().is_empty() {
            return Err(ProposalDomainError::EmptyInstruction);
        }
        if draft.commit_message.trim().is_empty() {
            return Err(ProposalDomainError::EmptyCommitMessage);
        }
        if draft.edits.is_empty() {
            return Err(ProposalDomainError::EmptyEditSet);
        }
        let mut seen = HashSet::new();
        for edit in &draft.edits {
            if edit.path().trim().is_empty() {
                return Err(ProposalDomainError::EmptyEditPath);
            }
            if !seen.insert(edit.path()) {
                return Err(ProposalDomainError::DuplicateEditPath(edit.path().to_owned()));
            }
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: ProposalId::new(),
            repository_id: draft.repository_id,
            user_id: draft.user_id,
            instruction: draft.instruction,
            plan: draft.plan,
            explanation: draft.explanation,
            risk: draft.risk,
            edits: draft.edits,
            commit_message: draft.commit_message,
            status: ProposalStatus::Pending,
            commit_id: None,
            error_message: None,
            revision: 0,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a proposal from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedChangeProposalData) -> Self {
        Self {
            id: data.id,
            repository_id: data.repository_id,
            user_id: data.user_id,
            instruction: data.instruction,
            plan: data.plan,
            explanation: data.explanation,
            risk: data.risk,
            edits: data.edits,
            commit_message: data.commit_message,
            status: data.status,
            commit_id: data.commit_id,
            error_message: data.error_message,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the proposal identifier.
    #[must_use]
    pub const fn id(&self) -> ProposalId {
        self.id
    }

    /// Returns the target repository.
    #[must_use]
    pub const fn repository_id(&self) -> RepositoryId {
        self.repository_id
    }

    /// Returns the submitting user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the instruction.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Returns the plan.
    #[must_use]
    pub fn plan(&self) -> &str {
        &self.plan
    }

    /// Returns the explanation.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Returns the risk classification.
    #[must_use]
    pub const fn risk(&self) -> RiskLevel {
        self.risk
    }

    /// Returns the ordered edits.
    #[must_use]
    pub fn edits(&self) -> &[FileEdit] {
        &self.edits
    }

    /// Returns the commit message.
    #[must_use]
    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> ProposalStatus {
        self.status
    }

    /// Returns the last commit created when the proposal was applied.
    #[must_use]
    pub const fn commit_id(&self) -> Option<&CommitId> {
        self.commit_id.as_ref()
    }

    /// Returns the aggregate error of the last failed apply attempt.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the optimistic-concurrency revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Claims a pending proposal for application and clears errors from
    /// any earlier attempt.
    ///
    /// Only `pending` can be claimed. An `approved` proposal belongs to the
    /// writer that claimed it; a claim abandoned by a crashed writer can
    /// still be rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError::AlreadyFinalized`] for committed or
    /// rejected proposals and [`ProposalDomainError::AlreadyClaimed`] for
    /// approved ones.
    pub fn begin_apply(&mut self, clock: &impl Clock) -> Result<(), ProposalDomainError> {
        self.ensure_open()?;
        if self.status == ProposalStatus::Approved {
            return Err(ProposalDomainError::AlreadyClaimed(self.id));
        }
        self.transition_to(ProposalStatus::Approved)?;
        self.error_message = None;
        for edit in &mut self.edits {
            edit.set_apply_error(None);
        }
        self.touch(clock);
        Ok(())
    }

    /// Records the failure of one edit during application.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError::AlreadyFinalized`] for committed or
    /// rejected proposals.
    pub fn record_edit_failure(
        &mut self,
        path: &str,
        error: impl Into<String>,
    ) -> Result<(), ProposalDomainError> {
        self.ensure_open()?;
        if let Some(edit) = self.edits.iter_mut().find(|edit| edit.path() == path) {
            edit.set_apply_error(Some(error.into()));
        }
        Ok(())
    }

    /// Marks the proposal committed with the newest commit identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError::AlreadyFinalized`] for committed or
    /// rejected proposals.
    pub fn mark_committed(
        &mut self,
        commit_id: CommitId,
        clock: &impl Clock,
    ) -> Result<(), ProposalDomainError> {
        self.transition_to(ProposalStatus::Committed)?;
        self.commit_id = Some(commit_id);
        self.touch(clock);
        Ok(())
    }

    /// Returns the proposal to `pending` after an attempt that wrote
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError::AlreadyFinalized`] for committed or
    /// rejected proposals.
    pub fn mark_apply_failed(
        &mut self,
        error_message: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ProposalDomainError> {
        self.ensure_open()?;
        self.status = ProposalStatus::Pending;
        self.error_message = Some(error_message.into());
        self.touch(clock);
        Ok(())
    }

    /// Rejects the proposal.
    ///
    /// Returns `false` without touching the proposal when it is already
    /// committed or rejected.
    pub fn reject(&mut self, clock: &impl Clock) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ProposalStatus::Rejected;
        self.touch(clock);
        true
    }

    const fn ensure_open(&self) -> Result<(), ProposalDomainError> {
        if self.status.is_terminal() {
            return Err(ProposalDomainError::AlreadyFinalized {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    fn transition_to(&mut self, target: ProposalStatus) -> Result<(), ProposalDomainError> {
        self.ensure_open()?;
        if !self.status.can_transition_to(target) {
            return Err(ProposalDomainError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.revision = self.revision.saturating_add(1);
        self.updated_at = clock.utc();
    }
}
