//! Port contracts for connected repositories.
//!
//! Ports define infrastructure-agnostic interfaces used by the planner,
//! applier and scheduler.

pub mod config;
pub mod gateway;

pub use config::{
    AutomationConfigRepository, AutomationConfigRepositoryError,
    AutomationConfigRepositoryResult,
};
pub use gateway::{GatewayError, GatewayResult, RepositoryGateway};
