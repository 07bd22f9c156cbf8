//! Repo autopilot: scheduled, oracle-driven maintenance of source
//! repositories.
//!
//! Each connected repository can run an unattended pipeline once a day at
//! a local time in its own timezone. A run assembles a bounded view of the
//! repository, asks a reasoning oracle for a structured edit set, stores
//! it as a change proposal and commits it through the repository gateway.
//! Attended instructions produce the same proposals but wait for review.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`repository`]: Repository configuration and content access
//! - [`schedule`]: Daily times, recurrence rules and fire instants
//! - [`diff`]: Unified diffs and line statistics
//! - [`proposal`]: Change proposals, their application and the run log
//! - [`planner`]: Oracle-backed modification planning
//! - [`automation`]: The pipeline, the scheduler and the caller facade

pub mod automation;
pub mod diff;
pub mod planner;
pub mod proposal;
pub mod repository;
pub mod schedule;
