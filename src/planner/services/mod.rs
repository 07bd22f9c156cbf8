//! Application services for planning repository changes.

mod planner;
mod prompt;

pub use planner::{ModificationPlanner, PlanOutcome, PlanRequest, PlannerError, PlannerResult};
pub use prompt::truncate_to_budget;
