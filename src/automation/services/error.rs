//! Service-level errors and their caller-facing classification.

use crate::automation::domain::BootstrapError;
use crate::planner::services::PlannerError;
use crate::proposal::{
    domain::{ProposalDomainError, ProposalId},
    ports::{ProposalRepositoryError, RunLogRepositoryError},
    services::{ApplyError, ProposalReviewError},
};
use crate::repository::{
    domain::{RepositoryDomainError, RepositoryId},
    ports::{AutomationConfigRepositoryError, GatewayError},
};
use crate::schedule::ScheduleError;
use thiserror::Error;

/// Caller-facing error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any state change.
    Validation,
    /// A repository, proposal or file does not exist.
    NotFound,
    /// Stale token, finalized proposal or concurrent writer; retry only
    /// after re-fetching.
    Conflict,
    /// The oracle answer broke the response contract.
    OracleContract,
    /// Network, oracle or storage failure.
    Transport,
    /// Template rendering failed.
    Internal,
}

/// Errors returned by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The repository configuration does not exist.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// Configurations could not be loaded.
    #[error(transparent)]
    Config(#[from] AutomationConfigRepositoryError),
}

/// Errors returned by the automation pipeline and facade.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The repository configuration does not exist.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// The proposal does not exist.
    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// Another run for the repository is in flight.
    #[error("a run for repository {0} is already in progress")]
    RunInProgress(RepositoryId),

    /// The meaningfulness gate dropped the edit set.
    #[error("change is not meaningful: {0}")]
    NotMeaningful(String),

    /// Invalid repository name, branch or schedule.
    #[error(transparent)]
    Repository(#[from] RepositoryDomainError),

    /// Invalid schedule input.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Configuration persistence failed.
    #[error(transparent)]
    Config(#[from] AutomationConfigRepositoryError),

    /// Repository content access failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Planning failed.
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Applying a proposal failed.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Proposal persistence failed.
    #[error(transparent)]
    ProposalStore(#[from] ProposalRepositoryError),

    /// Reviewing a proposal failed.
    #[error(transparent)]
    Review(#[from] ProposalReviewError),

    /// The run log could not be read or appended.
    #[error(transparent)]
    RunLog(#[from] RunLogRepositoryError),

    /// The scheduler failed.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The bootstrap README could not be rendered.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// Result type for automation operations.
pub type AutomationResult<T> = Result<T, AutomationError>;

impl AutomationError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RepositoryNotFound(_) | Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::RunInProgress(_) => ErrorKind::Conflict,
            Self::Repository(_) | Self::Schedule(_) | Self::NotMeaningful(_) => {
                ErrorKind::Validation
            }
            Self::Config(err) => config_kind(err),
            Self::Gateway(err) => gateway_kind(err),
            Self::Planner(err) => planner_kind(err),
            Self::Apply(err) => apply_kind(err),
            Self::ProposalStore(err) => store_kind(err),
            Self::Review(ProposalReviewError::NotFound(_)) => ErrorKind::NotFound,
            Self::Review(ProposalReviewError::Store(err)) => store_kind(err),
            Self::RunLog(err) => run_log_kind(err),
            Self::Scheduler(SchedulerError::RepositoryNotFound(_)) => ErrorKind::NotFound,
            Self::Scheduler(SchedulerError::Config(err)) => config_kind(err),
            Self::Bootstrap(_) => ErrorKind::Internal,
        }
    }
}

const fn config_kind(err: &AutomationConfigRepositoryError) -> ErrorKind {
    match err {
        AutomationConfigRepositoryError::DuplicateRepository(_)
        | AutomationConfigRepositoryError::RevisionConflict { .. } => ErrorKind::Conflict,
        AutomationConfigRepositoryError::NotFound(_) => ErrorKind::NotFound,
        AutomationConfigRepositoryError::Persistence(_) => ErrorKind::Transport,
    }
}

const fn gateway_kind(err: &GatewayError) -> ErrorKind {
    match err {
        GatewayError::NotFound(_) | GatewayError::RepositoryEmpty => ErrorKind::NotFound,
        GatewayError::Conflict(_) => ErrorKind::Conflict,
        GatewayError::Transport(_) => ErrorKind::Transport,
    }
}

const fn domain_kind(err: &ProposalDomainError) -> ErrorKind {
    match err {
        ProposalDomainError::AlreadyFinalized { .. }
        | ProposalDomainError::AlreadyClaimed(_)
        | ProposalDomainError::InvalidTransition { .. } => ErrorKind::Conflict,
        ProposalDomainError::EmptyInstruction
        | ProposalDomainError::EmptyEditSet
        | ProposalDomainError::EmptyCommitMessage
        | ProposalDomainError::EmptyEditPath
        | ProposalDomainError::DuplicateEditPath(_) => ErrorKind::Validation,
    }
}

const fn store_kind(err: &ProposalRepositoryError) -> ErrorKind {
    match err {
        ProposalRepositoryError::NotFound(_) => ErrorKind::NotFound,
        ProposalRepositoryError::DuplicateProposal(_)
        | ProposalRepositoryError::Finalized(_)
        | ProposalRepositoryError::RevisionConflict { .. } => ErrorKind::Conflict,
        ProposalRepositoryError::Persistence(_) => ErrorKind::Transport,
    }
}

const fn run_log_kind(err: &RunLogRepositoryError) -> ErrorKind {
    match err {
        RunLogRepositoryError::DuplicateRunLog(_) => ErrorKind::Conflict,
        RunLogRepositoryError::Persistence(_) => ErrorKind::Transport,
    }
}

const fn planner_kind(err: &PlannerError) -> ErrorKind {
    match err {
        PlannerError::Proposal(inner) => domain_kind(inner),
        PlannerError::Gateway(inner) => gateway_kind(inner),
        PlannerError::Oracle(_) | PlannerError::OracleTimeout(_) => ErrorKind::Transport,
        PlannerError::ContractViolation(_) => ErrorKind::OracleContract,
        PlannerError::Store(inner) => store_kind(inner),
        PlannerError::Template(_) => ErrorKind::Internal,
    }
}

const fn apply_kind(err: &ApplyError) -> ErrorKind {
    match err {
        ApplyError::NotFound(_) => ErrorKind::NotFound,
        ApplyError::Domain(inner) => domain_kind(inner),
        ApplyError::Store(inner) | ApplyError::Finalize { source: inner, .. } => store_kind(inner),
        ApplyError::RunLog(inner) => run_log_kind(inner),
        ApplyError::NothingCommitted { .. } => ErrorKind::Transport,
    }
}
