//! Port contracts for proposal and run-log persistence.

pub mod proposal;
pub mod run_log;

pub use proposal::{ProposalRepository, ProposalRepositoryError, ProposalRepositoryResult};
pub use run_log::{RunLogRepository, RunLogRepositoryError, RunLogRepositoryResult};
