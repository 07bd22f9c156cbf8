//! `PostgreSQL` adapters for proposal and run-log persistence.

mod models;
mod proposal;
mod run_log;
mod schema;

pub use proposal::PostgresProposalRepository;
pub use run_log::PostgresRunLogRepository;
