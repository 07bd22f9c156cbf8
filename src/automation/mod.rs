//! Unattended automation: the per-repository pipeline, its scheduler and
//! the operations exposed to callers.
//!
//! A scheduled or manual run loads the repository configuration, builds
//! context, bootstraps an empty repository with a README, plans a change
//! through the oracle and applies it. Each run appends one audit record,
//! except for runs parked for review, which are logged when approved.
//!
//! - Runtime settings and run reports in [`domain`]
//! - Pipeline, scheduler and facade in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
