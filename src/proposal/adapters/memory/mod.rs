//! In-memory adapters for proposal ports.

mod proposal;
mod run_log;

pub use proposal::InMemoryProposalRepository;
pub use run_log::InMemoryRunLogRepository;
