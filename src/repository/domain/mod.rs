//! Domain model for connected repositories.
//!
//! The configuration aggregate owns the schedule inputs and derives the
//! recurrence rule on demand; content value types describe what the
//! gateway reads and writes.

mod config;
mod content;
mod error;
mod ids;

pub use config::{PersistedRepositoryConfigData, RepositoryAutomationConfig};
pub use content::{
    CommitId, CommitSummary, ContentToken, FileSnapshot, RepositoryLocator, TreeEntry,
    TreeEntryKind, WriteReceipt,
};
pub use error::RepositoryDomainError;
pub use ids::{BranchName, RepositoryFullName, RepositoryId};
