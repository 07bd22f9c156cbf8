//! In-memory adapters for repository ports.

mod config;
mod gateway;

pub use config::InMemoryAutomationConfigRepository;
pub use gateway::InMemoryRepositoryGateway;
