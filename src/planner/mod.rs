//! Modification planning through an external reasoning oracle.
//!
//! The planner gathers a bounded view of a repository (tree, signal files,
//! primary language, recent history), asks the oracle for a structured
//! edit set, validates the answer against a strict contract and persists
//! the result as a pending change proposal. Unattended runs additionally
//! pass a meaningfulness gate that drops trivial single-file changes.
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
