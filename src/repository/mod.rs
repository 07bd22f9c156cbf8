//! Connected repositories and access to their content.
//!
//! A connected repository carries its automation configuration (enable
//! flag, daily time, timezone) and is reached through the
//! [`ports::RepositoryGateway`] port, which treats the remote store as a
//! path-keyed content store guarded by optimistic tokens. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
