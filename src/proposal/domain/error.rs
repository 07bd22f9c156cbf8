//! Error types for proposal domain validation and state transitions.

use super::{ProposalId, ProposalStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning proposals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProposalDomainError {
    /// The instruction is empty after trimming.
    #[error("instruction must not be empty")]
    EmptyInstruction,

    /// The proposal contains no edits.
    #[error("a proposal needs at least one file edit")]
    EmptyEditSet,

    /// The commit message is empty after trimming.
    #[error("commit message must not be empty")]
    EmptyCommitMessage,

    /// An edit path is empty.
    #[error("file edit path must not be empty")]
    EmptyEditPath,

    /// Two edits target the same path.
    #[error("duplicate file edit for {0}")]
    DuplicateEditPath(String),

    /// The proposal is committed or rejected.
    #[error("proposal {id} is already {status}")]
    AlreadyFinalized {
        /// Proposal identifier.
        id: ProposalId,
        /// Terminal status.
        status: ProposalStatus,
    },

    /// Another writer has claimed the proposal for application.
    #[error("proposal {0} is already being applied")]
    AlreadyClaimed(ProposalId),

    /// The requested transition is not allowed.
    #[error("proposal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Proposal identifier.
        id: ProposalId,
        /// Current status.
        from: ProposalStatus,
        /// Requested status.
        to: ProposalStatus,
    },
}

/// Error returned while parsing proposal enums from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseProposalValueError {
    /// Name of the value being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseProposalValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
