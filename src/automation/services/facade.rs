//! Operations exposed to the API layer.

use super::{
    AutomationError, AutomationPipeline, AutomationPorts, AutomationResult, RepositoryScheduler,
};
use crate::automation::domain::{AutomationSettings, RunReport};
use crate::planner::{ports::ReasoningOracle, services::PlanRequest};
use crate::proposal::{
    domain::{AutomationRunLog, ChangeProposal, ProposalId, UserId},
    ports::{ProposalRepository, RunLogRepository},
    services::{ApplyOutcome, ProposalReviewService},
};
use crate::repository::{
    domain::{BranchName, RepositoryAutomationConfig, RepositoryFullName, RepositoryId},
    ports::{AutomationConfigRepository, RepositoryGateway},
};
use crate::schedule::{RecurrenceRule, ScheduleTimeZone, parse_time};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Result of a schedule change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleUpdate {
    /// Stored configuration after the change.
    pub config: RepositoryAutomationConfig,
    /// Recurrence rule derived from the new time.
    pub recurrence_rule: RecurrenceRule,
    /// Next instant the new schedule fires at.
    pub next_fire: DateTime<Utc>,
}

/// Automation state of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationStatus {
    /// Stored configuration.
    pub config: RepositoryAutomationConfig,
    /// Whether a live timer exists.
    pub scheduled: bool,
    /// Next fire instant of the live timer.
    pub next_fire: Option<DateTime<Utc>>,
}

type Scheduler<R, G, O, P, L, C> = RepositoryScheduler<R, AutomationPipeline<R, G, O, P, L, C>, C>;

/// Entry point wiring configuration, planning, application and scheduling.
pub struct AutomationService<R, G, O, P, L, C>
where
    R: AutomationConfigRepository + 'static,
    G: RepositoryGateway + 'static,
    O: ReasoningOracle + 'static,
    P: ProposalRepository + 'static,
    L: RunLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    configs: Arc<R>,
    run_logs: Arc<L>,
    clock: Arc<C>,
    review: ProposalReviewService<P, C>,
    pipeline: Arc<AutomationPipeline<R, G, O, P, L, C>>,
    scheduler: Arc<Scheduler<R, G, O, P, L, C>>,
}

impl<R, G, O, P, L, C> AutomationService<R, G, O, P, L, C>
where
    R: AutomationConfigRepository + 'static,
    G: RepositoryGateway + 'static,
    O: ReasoningOracle + 'static,
    P: ProposalRepository + 'static,
    L: RunLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Wires the service from its ports. The scheduler starts stopped.
    #[must_use]
    pub fn new(ports: AutomationPorts<R, G, O, P, L, C>, settings: &AutomationSettings) -> Self {
        let review =
            ProposalReviewService::new(Arc::clone(&ports.proposals), Arc::clone(&ports.clock));
        let configs = Arc::clone(&ports.configs);
        let run_logs = Arc::clone(&ports.run_logs);
        let clock = Arc::clone(&ports.clock);
        let pipeline = Arc::new(AutomationPipeline::new(ports, settings));
        let scheduler = Arc::new(RepositoryScheduler::new(
            Arc::clone(&configs),
            Arc::clone(&pipeline),
            Arc::clone(&clock),
            settings.reconcile_interval,
        ));
        Self {
            configs,
            run_logs,
            clock,
            review,
            pipeline,
            scheduler,
        }
    }

    /// Returns the scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<Scheduler<R, G, O, P, L, C>> {
        &self.scheduler
    }

    /// Returns the pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Arc<AutomationPipeline<R, G, O, P, L, C>> {
        &self.pipeline
    }

    /// Schedules every enabled repository and starts reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Scheduler`] when configurations cannot
    /// be listed.
    pub async fn start(&self) -> AutomationResult<usize> {
        Ok(self.scheduler.start().await?)
    }

    /// Stops every timer; in-flight runs complete.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Connects a repository with automation disabled at midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Repository`] for a malformed name or
    /// branch and [`AutomationError::Config`] when the repository is
    /// already connected.
    pub async fn connect_repository(
        &self,
        full_name: &str,
        default_branch: &str,
        description: Option<&str>,
    ) -> AutomationResult<RepositoryAutomationConfig> {
        let name = RepositoryFullName::new(full_name)?;
        let branch = BranchName::new(default_branch)?;
        let mut config = RepositoryAutomationConfig::new(name, branch, &*self.clock);
        if let Some(text) = description.map(str::trim).filter(|text| !text.is_empty()) {
            config = config.with_description(text);
        }
        self.configs.store(&config).await?;
        info!(
            repository_id = %config.id(),
            repository = %config.full_name(),
            "repository connected"
        );
        Ok(config)
    }

    /// Removes a repository and its job.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Config`] when the configuration cannot
    /// be deleted.
    pub async fn disconnect_repository(&self, repository_id: RepositoryId) -> AutomationResult<()> {
        let deleted = self.configs.delete(repository_id).await;
        self.scheduler.sync_repository(repository_id).await?;
        deleted?;
        info!(repository_id = %repository_id, "repository disconnected");
        Ok(())
    }

    /// Enables automation and schedules the repository.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RepositoryNotFound`] for an unknown
    /// repository and [`AutomationError::Config`] when persistence fails
    /// or another writer changed the configuration since it was loaded.
    pub async fn enable_automation(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<RepositoryAutomationConfig> {
        let mut config = self.load(repository_id).await?;
        let loaded = config.revision();
        config.enable(&*self.clock);
        self.configs.update(&config, loaded).await?;
        self.scheduler.sync_repository(repository_id).await?;
        Ok(config)
    }

    /// Disables automation and stops the repository's job.
    ///
    /// A run already in flight completes.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RepositoryNotFound`] for an unknown
    /// repository and [`AutomationError::Config`] when persistence fails
    /// or another writer changed the configuration since it was loaded.
    pub async fn disable_automation(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<RepositoryAutomationConfig> {
        let mut config = self.load(repository_id).await?;
        let loaded = config.revision();
        config.disable(&*self.clock);
        self.configs.update(&config, loaded).await?;
        self.scheduler.sync_repository(repository_id).await?;
        Ok(config)
    }

    /// Changes the daily time and timezone, replacing the job.
    ///
    /// Input is validated before anything is loaded or stored.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Schedule`] for a malformed time or an
    /// unknown timezone, [`AutomationError::RepositoryNotFound`] for an
    /// unknown repository and [`AutomationError::Config`] when persistence
    /// fails or another writer changed the configuration since it was
    /// loaded.
    pub async fn update_schedule(
        &self,
        repository_id: RepositoryId,
        scheduled_time: &str,
        timezone: &str,
    ) -> AutomationResult<ScheduleUpdate> {
        let time = parse_time(scheduled_time)?;
        let zone = ScheduleTimeZone::new(timezone)?;
        let mut config = self.load(repository_id).await?;
        let loaded = config.revision();
        config.update_schedule(time, zone, &*self.clock);
        self.configs.update(&config, loaded).await?;
        self.scheduler.sync_repository(repository_id).await?;
        Ok(ScheduleUpdate {
            recurrence_rule: config.recurrence_rule(),
            next_fire: config.next_fire_after(self.clock.utc()),
            config,
        })
    }

    /// Runs the pipeline now, outside the schedule.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error of a failed run.
    pub async fn trigger_now(&self, repository_id: RepositoryId) -> AutomationResult<RunReport> {
        self.scheduler.process_repository_manually(repository_id).await
    }

    /// Plans a pending proposal for an ad hoc instruction.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Planner`] for a blank instruction or a
    /// failed plan.
    pub async fn submit_instruction(
        &self,
        repository_id: RepositoryId,
        instruction: &str,
        user_id: Option<UserId>,
    ) -> AutomationResult<ChangeProposal> {
        let mut request = PlanRequest::new(instruction);
        if let Some(user) = user_id {
            request = request.with_user(user);
        }
        self.pipeline.submit(repository_id, &request).await
    }

    /// Applies a pending or approved proposal.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Apply`] when application fails, including
    /// the conflict of an already finalized proposal.
    pub async fn approve_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> AutomationResult<ApplyOutcome> {
        self.pipeline.approve(proposal_id).await
    }

    /// Rejects a proposal; finalized proposals are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Review`] for an unknown proposal or a
    /// concurrent writer.
    pub async fn reject_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> AutomationResult<ChangeProposal> {
        Ok(self.review.reject(proposal_id).await?)
    }

    /// Returns pending proposals of a repository, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Review`] when the query fails.
    pub async fn list_pending(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<Vec<ChangeProposal>> {
        Ok(self.review.list_pending(repository_id).await?)
    }

    /// Returns up to `limit` runs of a repository, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RunLog`] when the query fails.
    pub async fn list_runs(
        &self,
        repository_id: RepositoryId,
        limit: usize,
    ) -> AutomationResult<Vec<AutomationRunLog>> {
        Ok(self
            .run_logs
            .list_for_repository(repository_id, limit)
            .await?)
    }

    /// Returns the stored configuration and live job state.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RepositoryNotFound`] for an unknown
    /// repository.
    pub async fn automation_status(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<AutomationStatus> {
        let config = self.load(repository_id).await?;
        let job = self
            .scheduler
            .job(repository_id)
            .filter(|snapshot| snapshot.live);
        Ok(AutomationStatus {
            config,
            scheduled: job.is_some(),
            next_fire: job.map(|snapshot| snapshot.next_fire),
        })
    }

    async fn load(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<RepositoryAutomationConfig> {
        self.configs
            .find_by_id(repository_id)
            .await?
            .ok_or(AutomationError::RepositoryNotFound(repository_id))
    }
}
