//! Outcomes of a single pipeline run.

use crate::proposal::domain::ProposalId;
use crate::repository::domain::CommitId;

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another run for the same repository is in flight.
    AlreadyRunning,
    /// A scheduled fire found automation disabled.
    AutomationDisabled,
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// A proposal was applied.
    Committed {
        /// Applied proposal.
        proposal_id: ProposalId,
        /// Newest commit created.
        commit_id: CommitId,
        /// Paths written, in proposal order.
        committed_files: Vec<String>,
        /// Paths whose edit failed.
        failed_files: Vec<String>,
    },
    /// An empty repository received its initial README.
    Bootstrapped {
        /// Commit creating the README.
        commit_id: CommitId,
    },
    /// A pending proposal waits for review.
    AwaitingReview {
        /// Stored proposal.
        proposal_id: ProposalId,
    },
    /// The meaningfulness gate dropped the edit set.
    NotMeaningful {
        /// Gate explanation.
        reason: String,
    },
    /// Nothing ran.
    Skipped(SkipReason),
}

impl RunReport {
    /// Returns the commit created by the run, if any.
    #[must_use]
    pub const fn commit_id(&self) -> Option<&CommitId> {
        match self {
            Self::Committed { commit_id, .. } | Self::Bootstrapped { commit_id } => Some(commit_id),
            Self::AwaitingReview { .. } | Self::NotMeaningful { .. } | Self::Skipped(_) => None,
        }
    }
}
