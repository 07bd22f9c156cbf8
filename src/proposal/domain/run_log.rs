//! Append-only audit records of pipeline executions.

use super::{ParseProposalValueError, ProposalId, RunLogId};
use crate::repository::domain::{CommitId, RepositoryId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// At least one file was committed.
    Success,
    /// Nothing was committed.
    Failed,
}

impl RunStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for RunStatus {
    type Error = ParseProposalValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseProposalValueError::new("run status", value)),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What started a pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// A repository timer fired.
    Scheduled,
    /// An operator requested an immediate run.
    Manual,
    /// A reviewer approved a pending proposal.
    Review,
}

impl RunTrigger {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
            Self::Review => "review",
        }
    }

    /// Returns whether the run happens without a human in the loop.
    #[must_use]
    pub const fn is_unattended(self) -> bool {
        matches!(self, Self::Scheduled | Self::Manual)
    }
}

impl TryFrom<&str> for RunTrigger {
    type Error = ParseProposalValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "manual" => Ok(Self::Manual),
            "review" => Ok(Self::Review),
            _ => Err(ParseProposalValueError::new("run trigger", value)),
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder collecting the details of a run before it is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogEntry {
    repository_id: RepositoryId,
    trigger: RunTrigger,
    proposal_id: Option<ProposalId>,
    commit_id: Option<CommitId>,
    commit_message: String,
    files_changed: Vec<String>,
    analysis: String,
}

impl RunLogEntry {
    /// Starts an entry for a run of `repository_id`.
    #[must_use]
    pub const fn new(repository_id: RepositoryId, trigger: RunTrigger) -> Self {
        Self {
            repository_id,
            trigger,
            proposal_id: None,
            commit_id: None,
            commit_message: String::new(),
            files_changed: Vec::new(),
            analysis: String::new(),
        }
    }

    /// Links the proposal the run applied.
    #[must_use]
    pub const fn with_proposal(mut self, proposal_id: ProposalId) -> Self {
        self.proposal_id = Some(proposal_id);
        self
    }

    /// Sets the resulting commit.
    #[must_use]
    pub fn with_commit(mut self, commit_id: Option<CommitId>) -> Self {
        self.commit_id = commit_id;
        self
    }

    /// Sets the commit message.
    #[must_use]
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Sets the files touched by the run.
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.files_changed = files.into_iter().collect();
        self
    }

    /// Sets the free-text analysis.
    #[must_use]
    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = analysis.into();
        self
    }

    /// Finalizes the entry as a successful run.
    #[must_use]
    pub fn succeeded(self, clock: &impl Clock) -> AutomationRunLog {
        self.finish(RunStatus::Success, None, clock)
    }

    /// Finalizes the entry as a failed run.
    #[must_use]
    pub fn failed(self, detail: impl Into<String>, clock: &impl Clock) -> AutomationRunLog {
        self.finish(RunStatus::Failed, Some(detail.into()), clock)
    }

    fn finish(
        self,
        status: RunStatus,
        error_detail: Option<String>,
        clock: &impl Clock,
    ) -> AutomationRunLog {
        AutomationRunLog {
            id: RunLogId::new(),
            repository_id: self.repository_id,
            proposal_id: self.proposal_id,
            trigger: self.trigger,
            status,
            commit_id: self.commit_id,
            commit_message: self.commit_message,
            files_changed: self.files_changed,
            analysis: self.analysis,
            error_detail,
            created_at: clock.utc(),
        }
    }
}

/// Immutable record of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRunLog {
    id: RunLogId,
    repository_id: RepositoryId,
    proposal_id: Option<ProposalId>,
    trigger: RunTrigger,
    status: RunStatus,
    commit_id: Option<CommitId>,
    commit_message: String,
    files_changed: Vec<String>,
    analysis: String,
    error_detail: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRunLogData {
    /// Persisted run identifier.
    pub id: RunLogId,
    /// Persisted repository identifier.
    pub repository_id: RepositoryId,
    /// Persisted proposal link, if any.
    pub proposal_id: Option<ProposalId>,
    /// Persisted trigger.
    pub trigger: RunTrigger,
    /// Persisted outcome.
    pub status: RunStatus,
    /// Persisted resulting commit, if any.
    pub commit_id: Option<CommitId>,
    /// Persisted commit message.
    pub commit_message: String,
    /// Persisted touched files.
    pub files_changed: Vec<String>,
    /// Persisted analysis.
    pub analysis: String,
    /// Persisted error detail, if any.
    pub error_detail: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl AutomationRunLog {
    /// Reconstructs a run log from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRunLogData) -> Self {
        Self {
            id: data.id,
            repository_id: data.repository_id,
            proposal_id: data.proposal_id,
            trigger: data.trigger,
            status: data.status,
            commit_id: data.commit_id,
            commit_message: data.commit_message,
            files_changed: data.files_changed,
            analysis: data.analysis,
            error_detail: data.error_detail,
            created_at: data.created_at,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn id(&self) -> RunLogId {
        self.id
    }

    /// Returns the repository identifier.
    #[must_use]
    pub const fn repository_id(&self) -> RepositoryId {
        self.repository_id
    }

    /// Returns the applied proposal, if any.
    #[must_use]
    pub const fn proposal_id(&self) -> Option<ProposalId> {
        self.proposal_id
    }

    /// Returns what started the run.
    #[must_use]
    pub const fn trigger(&self) -> RunTrigger {
        self.trigger
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the resulting commit, if any.
    #[must_use]
    pub const fn commit_id(&self) -> Option<&CommitId> {
        self.commit_id.as_ref()
    }

    /// Returns the commit message.
    #[must_use]
    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    /// Returns the files touched by the run.
    #[must_use]
    pub fn files_changed(&self) -> &[String] {
        &self.files_changed
    }

    /// Returns the free-text analysis.
    #[must_use]
    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    /// Returns the failure detail, if any.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
