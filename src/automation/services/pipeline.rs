//! The unattended repository pipeline.
//!
//! One run loads the configuration, assembles context and then either
//! bootstraps an empty repository or plans and applies a change. Every
//! run that gets past the reentrancy guard appends exactly one run log
//! entry, unless it stops at a pending proposal for review.

use super::{AutomationError, AutomationResult, InFlightRuns, RepositoryRunner};
use crate::automation::domain::{
    AutomationSettings, BOOTSTRAP_ANALYSIS, BOOTSTRAP_COMMIT_MESSAGE, BOOTSTRAP_PATH, RunReport,
    SkipReason, render_readme,
};
use crate::planner::{
    ports::ReasoningOracle,
    services::{ModificationPlanner, PlanOutcome, PlanRequest},
};
use crate::proposal::{
    domain::{AutomationRunLog, ChangeProposal, ProposalId, RunLogEntry, RunTrigger},
    ports::{ProposalRepository, RunLogRepository},
    services::{ApplyOutcome, ChangeApplier},
};
use crate::repository::{
    domain::{RepositoryAutomationConfig, RepositoryId},
    ports::{AutomationConfigRepository, RepositoryGateway},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Port implementations shared by the pipeline and the facade.
pub struct AutomationPorts<R, G, O, P, L, C> {
    /// Repository configurations.
    pub configs: Arc<R>,
    /// Remote repository content.
    pub gateway: Arc<G>,
    /// Reasoning oracle.
    pub oracle: Arc<O>,
    /// Change proposals.
    pub proposals: Arc<P>,
    /// Run log.
    pub run_logs: Arc<L>,
    /// Time source.
    pub clock: Arc<C>,
}

impl<R, G, O, P, L, C> Clone for AutomationPorts<R, G, O, P, L, C> {
    fn clone(&self) -> Self {
        Self {
            configs: Arc::clone(&self.configs),
            gateway: Arc::clone(&self.gateway),
            oracle: Arc::clone(&self.oracle),
            proposals: Arc::clone(&self.proposals),
            run_logs: Arc::clone(&self.run_logs),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Plans, applies and audits changes for one repository at a time.
pub struct AutomationPipeline<R, G, O, P, L, C>
where
    R: AutomationConfigRepository,
    G: RepositoryGateway,
    O: ReasoningOracle,
    P: ProposalRepository,
    L: RunLogRepository,
    C: Clock + Send + Sync,
{
    configs: Arc<R>,
    gateway: Arc<G>,
    proposals: Arc<P>,
    run_logs: Arc<L>,
    clock: Arc<C>,
    planner: ModificationPlanner<G, O, P, C>,
    applier: ChangeApplier<P, L, G, C>,
    in_flight: InFlightRuns,
    review_unattended: bool,
    unattended_instruction: String,
}

impl<R, G, O, P, L, C> AutomationPipeline<R, G, O, P, L, C>
where
    R: AutomationConfigRepository,
    G: RepositoryGateway,
    O: ReasoningOracle,
    P: ProposalRepository,
    L: RunLogRepository,
    C: Clock + Send + Sync,
{
    /// Wires a pipeline from its ports.
    #[must_use]
    pub fn new(ports: AutomationPorts<R, G, O, P, L, C>, settings: &AutomationSettings) -> Self {
        let planner = ModificationPlanner::new(
            Arc::clone(&ports.gateway),
            ports.oracle,
            Arc::clone(&ports.proposals),
            Arc::clone(&ports.clock),
            settings.planner,
        );
        let applier = ChangeApplier::new(
            Arc::clone(&ports.proposals),
            Arc::clone(&ports.run_logs),
            Arc::clone(&ports.gateway),
            Arc::clone(&ports.clock),
        );
        Self {
            configs: ports.configs,
            gateway: ports.gateway,
            proposals: ports.proposals,
            run_logs: ports.run_logs,
            clock: ports.clock,
            planner,
            applier,
            in_flight: InFlightRuns::new(),
            review_unattended: settings.review_unattended,
            unattended_instruction: settings.unattended_instruction.clone(),
        }
    }

    /// Returns the reentrancy guard shared by all runs of this pipeline.
    #[must_use]
    pub const fn in_flight(&self) -> &InFlightRuns {
        &self.in_flight
    }

    /// Runs the unattended pipeline once for a repository.
    ///
    /// An overlapping run for the same repository is skipped, as is a
    /// scheduled fire for a repository whose automation has been disabled.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RepositoryNotFound`] for an unknown
    /// repository and the underlying error of any failed step. Failures
    /// after the configuration loads are recorded as a `failed` run.
    pub async fn run_repository(
        &self,
        repository_id: RepositoryId,
        trigger: RunTrigger,
    ) -> AutomationResult<RunReport> {
        let Some(_guard) = self.in_flight.try_acquire(repository_id) else {
            warn!(
                repository_id = %repository_id,
                trigger = %trigger,
                "run already in flight; skipping"
            );
            return Ok(RunReport::Skipped(SkipReason::AlreadyRunning));
        };

        let config = self.load_config(repository_id).await?;
        if matches!(trigger, RunTrigger::Scheduled) && !config.automation_enabled() {
            info!(repository_id = %repository_id, "automation disabled; skipping scheduled run");
            return Ok(RunReport::Skipped(SkipReason::AutomationDisabled));
        }

        info!(
            repository_id = %repository_id,
            repository = %config.full_name(),
            trigger = %trigger,
            "starting automation run"
        );
        match self.execute(&config, trigger).await {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(
                    repository_id = %repository_id,
                    trigger = %trigger,
                    error = %err,
                    "automation run failed"
                );
                let already_logged =
                    matches!(&err, AutomationError::Apply(apply) if apply.run_logged());
                if !already_logged {
                    let entry = RunLogEntry::new(repository_id, trigger)
                        .with_analysis("Automation run failed");
                    self.append_log(entry.failed(err.to_string(), &*self.clock))
                        .await;
                }
                Err(err)
            }
        }
    }

    /// Plans a pending proposal for an ad hoc instruction.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::RepositoryNotFound`] for an unknown
    /// repository and [`AutomationError::Planner`] when planning fails.
    pub async fn submit(
        &self,
        repository_id: RepositoryId,
        request: &PlanRequest,
    ) -> AutomationResult<ChangeProposal> {
        let config = self.load_config(repository_id).await?;
        let context = self.planner.build_context(&config).await?;
        match self.planner.propose(&config, &context, request).await? {
            PlanOutcome::Proposed(proposal) => Ok(proposal),
            PlanOutcome::NotMeaningful(reason) => Err(AutomationError::NotMeaningful(reason)),
        }
    }

    /// Applies a reviewed proposal.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::ProposalNotFound`] for an unknown
    /// proposal, [`AutomationError::RunInProgress`] while another run for
    /// the repository is in flight, and [`AutomationError::Apply`] when
    /// application fails.
    pub async fn approve(&self, proposal_id: ProposalId) -> AutomationResult<ApplyOutcome> {
        let proposal = self
            .proposals
            .find_by_id(proposal_id)
            .await?
            .ok_or(AutomationError::ProposalNotFound(proposal_id))?;
        let repository_id = proposal.repository_id();
        let _guard = self
            .in_flight
            .try_acquire(repository_id)
            .ok_or(AutomationError::RunInProgress(repository_id))?;

        let config = self.load_config(repository_id).await?;
        let outcome = self
            .applier
            .apply(proposal_id, &config.locator(), RunTrigger::Review)
            .await?;
        self.record_run(repository_id).await;
        Ok(outcome)
    }

    async fn execute(
        &self,
        config: &RepositoryAutomationConfig,
        trigger: RunTrigger,
    ) -> AutomationResult<RunReport> {
        let context = self.planner.build_context(config).await?;
        if context.is_empty() {
            return self.bootstrap(config, trigger).await;
        }

        let request = PlanRequest::new(self.unattended_instruction.clone()).unattended();
        let proposal = match self.planner.propose(config, &context, &request).await? {
            PlanOutcome::Proposed(proposal) => proposal,
            PlanOutcome::NotMeaningful(reason) => {
                let entry =
                    RunLogEntry::new(config.id(), trigger).with_analysis("Change not meaningful");
                self.run_logs
                    .append(&entry.failed(reason.clone(), &*self.clock))
                    .await?;
                return Ok(RunReport::NotMeaningful { reason });
            }
        };

        if self.review_unattended {
            info!(
                repository_id = %config.id(),
                proposal_id = %proposal.id(),
                "proposal awaits review"
            );
            return Ok(RunReport::AwaitingReview {
                proposal_id: proposal.id(),
            });
        }

        let outcome = self
            .applier
            .apply(proposal.id(), &config.locator(), trigger)
            .await?;
        self.record_run(config.id()).await;
        Ok(RunReport::Committed {
            proposal_id: proposal.id(),
            commit_id: outcome.last_commit_id,
            committed_files: outcome.committed_files,
            failed_files: outcome
                .failures
                .into_iter()
                .map(|failure| failure.path)
                .collect(),
        })
    }

    async fn bootstrap(
        &self,
        config: &RepositoryAutomationConfig,
        trigger: RunTrigger,
    ) -> AutomationResult<RunReport> {
        let content = render_readme(config.full_name(), config.description())?;
        let receipt = self
            .gateway
            .write_file(
                &config.locator(),
                BOOTSTRAP_PATH,
                &content,
                BOOTSTRAP_COMMIT_MESSAGE,
                None,
            )
            .await?;

        let log = RunLogEntry::new(config.id(), trigger)
            .with_commit(Some(receipt.commit_id.clone()))
            .with_commit_message(BOOTSTRAP_COMMIT_MESSAGE)
            .with_files([BOOTSTRAP_PATH.to_owned()])
            .with_analysis(BOOTSTRAP_ANALYSIS)
            .succeeded(&*self.clock);
        self.run_logs.append(&log).await?;
        self.record_run(config.id()).await;

        info!(
            repository_id = %config.id(),
            commit_id = %receipt.commit_id,
            "bootstrapped empty repository"
        );
        Ok(RunReport::Bootstrapped {
            commit_id: receipt.commit_id,
        })
    }

    async fn load_config(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<RepositoryAutomationConfig> {
        self.configs
            .find_by_id(repository_id)
            .await?
            .ok_or(AutomationError::RepositoryNotFound(repository_id))
    }

    /// Stamps `last_run_at` on the stored configuration.
    ///
    /// Only the timestamp is written, so an enable, disable or schedule
    /// change made while the run was in flight survives. Failures only
    /// warn, since the run itself already succeeded and was logged.
    async fn record_run(&self, repository_id: RepositoryId) {
        if let Err(err) = self
            .configs
            .record_last_run(repository_id, self.clock.utc())
            .await
        {
            warn!(repository_id = %repository_id, error = %err, "failed to record last run");
        }
    }

    async fn append_log(&self, log: AutomationRunLog) {
        if let Err(err) = self.run_logs.append(&log).await {
            warn!(
                repository_id = %log.repository_id(),
                error = %err,
                "failed to append run log"
            );
        }
    }
}

#[async_trait]
impl<R, G, O, P, L, C> RepositoryRunner for AutomationPipeline<R, G, O, P, L, C>
where
    R: AutomationConfigRepository,
    G: RepositoryGateway,
    O: ReasoningOracle,
    P: ProposalRepository,
    L: RunLogRepository,
    C: Clock + Send + Sync,
{
    async fn run(
        &self,
        repository_id: RepositoryId,
        trigger: RunTrigger,
    ) -> AutomationResult<RunReport> {
        self.run_repository(repository_id, trigger).await
    }
}
