//! Application services for proposal application and review.

mod applier;
mod review;

pub use applier::{ApplyError, ApplyOutcome, ApplyResult, ChangeApplier, EditFailure};
pub use review::{ProposalReviewError, ProposalReviewResult, ProposalReviewService};
