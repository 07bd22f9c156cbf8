//! Error types for repository domain validation.

use crate::schedule::ScheduleError;
use thiserror::Error;

/// Errors returned while constructing repository domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryDomainError {
    /// The repository name does not follow `owner/repo` format.
    #[error("invalid repository name '{0}', expected owner/repo")]
    InvalidRepository(String),

    /// The branch name is empty or contains whitespace.
    #[error("invalid branch name '{0}'")]
    InvalidBranch(String),

    /// The schedule time or timezone is invalid.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
