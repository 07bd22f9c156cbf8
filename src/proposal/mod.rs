//! Change proposals, their application and the automation audit trail.
//!
//! A change proposal is one batch of file edits suggested for a
//! repository. It starts `pending`, may pass through `approved`, and ends
//! either `committed` (at least one edit landed) or `rejected`. The
//! [`services::ChangeApplier`] writes the edits through the repository
//! gateway one by one, tolerating individual failures, and appends one
//! [`domain::AutomationRunLog`] per execution.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
