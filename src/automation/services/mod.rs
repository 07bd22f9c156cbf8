//! Automation services: the pipeline, its scheduler and the facade.

mod error;
mod facade;
mod guard;
mod pipeline;
mod runner;
mod scheduler;

pub use error::{AutomationError, AutomationResult, ErrorKind, SchedulerError};
pub use facade::{AutomationService, AutomationStatus, ScheduleUpdate};
pub use guard::{InFlightRuns, RunGuard};
pub use pipeline::{AutomationPipeline, AutomationPorts};
pub use runner::RepositoryRunner;
pub use scheduler::{JobSnapshot, RepositoryScheduler};
