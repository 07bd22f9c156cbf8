//! Seam between the scheduler and the pipeline it fires.

use super::AutomationResult;
use crate::automation::domain::RunReport;
use crate::proposal::domain::RunTrigger;
use crate::repository::domain::RepositoryId;
use async_trait::async_trait;

/// Runs the automation pipeline for one repository.
#[async_trait]
pub trait RepositoryRunner: Send + Sync {
    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns [`super::AutomationError`] when the run fails. A failing run
    /// has already been logged by the time this returns.
    async fn run(
        &self,
        repository_id: RepositoryId,
        trigger: RunTrigger,
    ) -> AutomationResult<RunReport>;
}
