//! Domain model for change proposals and run logs.

mod edit;
mod error;
mod ids;
mod proposal;
mod run_log;

pub use edit::{EditAction, FileEdit};
pub use error::{ParseProposalValueError, ProposalDomainError};
pub use ids::{ProposalId, RunLogId, UserId};
pub use proposal::{
    ChangeProposal, PersistedChangeProposalData, ProposalDraft, ProposalStatus, RiskLevel,
};
pub use run_log::{AutomationRunLog, PersistedRunLogData, RunLogEntry, RunStatus, RunTrigger};
