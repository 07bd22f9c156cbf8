//! Service tests for single pipeline runs.

use super::fixtures::{README, World, meaningful_update, trivial_update};
use crate::automation::domain::{
    AutomationSettings, BOOTSTRAP_ANALYSIS, BOOTSTRAP_COMMIT_MESSAGE, RunReport, SkipReason,
};
use crate::automation::services::{AutomationError, AutomationPipeline, AutomationPorts, ErrorKind};
use crate::planner::ports::{OracleError, OracleResult, ReasoningOracle};
use crate::proposal::{
    domain::{ChangeProposal, ProposalId, ProposalStatus, RunStatus, RunTrigger},
    ports::{ProposalRepository, RunLogRepository},
    services::ApplyError,
};
use crate::repository::{
    adapters::memory::InMemoryAutomationConfigRepository,
    domain::RepositoryId,
    ports::AutomationConfigRepository,
};
use async_trait::async_trait;
use eyre::{Result, bail, ensure, eyre};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::Value;
use std::sync::Arc;

#[fixture]
fn world() -> World {
    World::new()
}

#[rstest]
#[case(Some("Widgets for everyone"), "Widgets for everyone")]
#[case(None, "A new repository")]
#[tokio::test(flavor = "multi_thread")]
async fn empty_repository_is_bootstrapped(
    world: World,
    #[case] description: Option<&str>,
    #[case] expected_text: &str,
) -> Result<()> {
    let config = world.connect(description).await?;
    let pipeline = world.pipeline(&AutomationSettings::default());

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;

    let RunReport::Bootstrapped { commit_id } = report else {
        bail!("expected a bootstrap, got {report:?}");
    };
    let readme = world
        .ports
        .gateway
        .file(&config.locator(), "README.md")?
        .unwrap_or_default();
    ensure!(readme.starts_with("# widgets\n"));
    ensure!(readme.contains(expected_text));
    ensure!(world.oracle.calls().is_empty());

    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    let [log] = logs.as_slice() else {
        bail!("expected one run log, got {}", logs.len());
    };
    ensure!(log.status() == RunStatus::Success);
    ensure!(log.trigger() == RunTrigger::Scheduled);
    ensure!(log.commit_id() == Some(&commit_id));
    ensure!(log.commit_message() == BOOTSTRAP_COMMIT_MESSAGE);
    ensure!(log.files_changed() == ["README.md".to_owned()]);
    ensure!(log.analysis() == BOOTSTRAP_ANALYSIS);

    let stored = world.ports.configs.find_by_id(config.id()).await?;
    ensure!(stored.and_then(|value| value.last_run_at()).is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn meaningful_change_is_committed(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(meaningful_update());
    let pipeline = world.pipeline(&AutomationSettings::default());

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Manual)
        .await?;

    let RunReport::Committed {
        proposal_id,
        committed_files,
        failed_files,
        ..
    } = report
    else {
        bail!("expected a commit, got {report:?}");
    };
    ensure!(committed_files == vec!["README.md".to_owned()]);
    ensure!(failed_files.is_empty());

    let readme = world
        .ports
        .gateway
        .file(&config.locator(), "README.md")?
        .unwrap_or_default();
    ensure!(readme.contains("## Installation"));

    let proposal = world.ports.proposals.find_by_id(proposal_id).await?;
    ensure!(proposal.map(|value| value.status()) == Some(ProposalStatus::Committed));

    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    ensure!(logs.len() == 1);
    ensure!(logs.iter().all(|log| log.status() == RunStatus::Success
        && log.trigger() == RunTrigger::Manual
        && log.proposal_id() == Some(proposal_id)));

    let stored = world.ports.configs.find_by_id(config.id()).await?;
    ensure!(stored.and_then(|value| value.last_run_at()).is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trivial_change_is_logged_and_dropped(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(trivial_update());
    let pipeline = world.pipeline(&AutomationSettings::default());

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;

    let RunReport::NotMeaningful { reason } = report else {
        bail!("expected the gate to drop the change, got {report:?}");
    };
    ensure!(reason.contains("below meaningfulness threshold"));

    let readme = world.ports.gateway.file(&config.locator(), "README.md")?;
    ensure!(readme.as_deref() == Some(README));
    let stored = world
        .ports
        .proposals
        .find_by_repository(config.id(), None)
        .await?;
    ensure!(stored.is_empty());

    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    let [log] = logs.as_slice() else {
        bail!("expected one run log, got {}", logs.len());
    };
    ensure!(log.status() == RunStatus::Failed);
    ensure!(log.error_detail() == Some(reason.as_str()));
    ensure!(log.commit_id().is_none());

    let config_after = world.ports.configs.find_by_id(config.id()).await?;
    ensure!(config_after.and_then(|value| value.last_run_at()).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_mode_waits_for_approval(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(meaningful_update());
    let pipeline = world.pipeline(&AutomationSettings::default().with_review_unattended(true));

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;

    let RunReport::AwaitingReview { proposal_id } = report else {
        bail!("expected a pending proposal, got {report:?}");
    };
    let pending = world.ports.proposals.find_pending(config.id()).await?;
    ensure!(pending.iter().map(ChangeProposal::id).eq([proposal_id]));
    let before = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    ensure!(before.is_empty());

    let outcome = pipeline.approve(proposal_id).await?;

    ensure!(outcome.proposal.status() == ProposalStatus::Committed);
    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    ensure!(logs.len() == 1);
    ensure!(logs.iter().all(|log| log.trigger() == RunTrigger::Review));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlapping_run_is_skipped(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    let pipeline = world.pipeline(&AutomationSettings::default());
    let _held = pipeline.in_flight().try_acquire(config.id());

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;

    ensure!(report == RunReport::Skipped(SkipReason::AlreadyRunning));
    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    ensure!(logs.is_empty());
    ensure!(world.ports.gateway.commit_count(&config.locator())? == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduled_fire_for_disabled_repository_is_skipped(world: World) -> Result<()> {
    let mut config = world.connect(None).await?;
    let loaded = config.revision();
    config.disable(&DefaultClock);
    world.ports.configs.update(&config, loaded).await?;
    let pipeline = world.pipeline(&AutomationSettings::default());

    let scheduled = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;
    let manual = pipeline
        .run_repository(config.id(), RunTrigger::Manual)
        .await?;

    ensure!(scheduled == RunReport::Skipped(SkipReason::AutomationDisabled));
    ensure!(matches!(manual, RunReport::Bootstrapped { .. }));
    Ok(())
}

/// Oracle that disables every enabled repository while it is thinking.
struct DisablingOracle {
    configs: Arc<InMemoryAutomationConfigRepository>,
    answer: Value,
}

#[async_trait]
impl ReasoningOracle for DisablingOracle {
    async fn generate(&self, _prompt: &str, _payload: &Value) -> OracleResult<Value> {
        let enabled = self
            .configs
            .list_enabled()
            .await
            .map_err(|err| OracleError::Rejected(err.to_string()))?;
        for mut config in enabled {
            let loaded = config.revision();
            config.disable(&DefaultClock);
            self.configs
                .update(&config, loaded)
                .await
                .map_err(|err| OracleError::Rejected(err.to_string()))?;
        }
        Ok(self.answer.clone())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disable_during_a_run_survives_run_bookkeeping(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    let oracle = DisablingOracle {
        configs: Arc::clone(&world.ports.configs),
        answer: meaningful_update(),
    };
    let ports = AutomationPorts {
        configs: Arc::clone(&world.ports.configs),
        gateway: Arc::clone(&world.ports.gateway),
        oracle: Arc::new(oracle),
        proposals: Arc::clone(&world.ports.proposals),
        run_logs: Arc::clone(&world.ports.run_logs),
        clock: Arc::new(DefaultClock),
    };
    let pipeline = AutomationPipeline::new(ports, &AutomationSettings::default());

    let report = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?;

    ensure!(matches!(report, RunReport::Committed { .. }), "got {report:?}");
    let stored = world
        .ports
        .configs
        .find_by_id(config.id())
        .await?
        .ok_or_else(|| eyre!("config should still exist"))?;
    ensure!(!stored.automation_enabled(), "the concurrent disable was lost");
    ensure!(stored.revision() == config.revision() + 1);
    ensure!(stored.last_run_at().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_repository_is_not_found(world: World) -> Result<()> {
    let pipeline = world.pipeline(&AutomationSettings::default());
    let missing = RepositoryId::new();

    let result = pipeline.run_repository(missing, RunTrigger::Manual).await;

    let Err(err) = result else {
        bail!("expected an error");
    };
    ensure!(matches!(err, AutomationError::RepositoryNotFound(id) if id == missing));
    ensure!(err.kind() == ErrorKind::NotFound);
    let logs = world.ports.run_logs.list_for_repository(missing, 10).await?;
    ensure!(logs.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oracle_failure_is_logged_as_failed_run(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world
        .oracle
        .push_failure(OracleError::Rejected("quota exhausted".to_owned()));
    let pipeline = world.pipeline(&AutomationSettings::default());

    let result = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await;

    let Err(err) = result else {
        bail!("expected the run to fail");
    };
    ensure!(err.kind() == ErrorKind::Transport);
    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    let [log] = logs.as_slice() else {
        bail!("expected one run log, got {}", logs.len());
    };
    ensure!(log.status() == RunStatus::Failed);
    ensure!(log.error_detail().is_some_and(|detail| detail.contains("quota exhausted")));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn total_apply_failure_is_logged_once(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.ports.gateway.fail_writes_to("README.md")?;
    world.oracle.push_answer(meaningful_update());
    let pipeline = world.pipeline(&AutomationSettings::default());

    let result = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await;

    ensure!(matches!(
        result,
        Err(AutomationError::Apply(ApplyError::NothingCommitted { .. }))
    ));
    let logs = world
        .ports
        .run_logs
        .list_for_repository(config.id(), 10)
        .await?;
    ensure!(logs.len() == 1);
    ensure!(logs.iter().all(|log| log.status() == RunStatus::Failed));

    let pending = world.ports.proposals.find_pending(config.id()).await?;
    ensure!(pending.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approve_is_refused_while_a_run_is_in_flight(world: World) -> Result<()> {
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(meaningful_update());
    let pipeline = world.pipeline(&AutomationSettings::default().with_review_unattended(true));
    let RunReport::AwaitingReview { proposal_id } = pipeline
        .run_repository(config.id(), RunTrigger::Scheduled)
        .await?
    else {
        bail!("expected a pending proposal");
    };

    let held = pipeline.in_flight().try_acquire(config.id());
    let refused = pipeline.approve(proposal_id).await;
    drop(held);

    let Err(err) = refused else {
        bail!("expected approval to be refused");
    };
    ensure!(matches!(err, AutomationError::RunInProgress(id) if id == config.id()));
    ensure!(err.kind() == ErrorKind::Conflict);
    let proposal = world.ports.proposals.find_by_id(proposal_id).await?;
    ensure!(proposal.map(|value| value.status()) == Some(ProposalStatus::Pending));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approving_unknown_proposal_is_not_found(world: World) -> Result<()> {
    let pipeline = world.pipeline(&AutomationSettings::default());
    let missing = ProposalId::new();

    let result = pipeline.approve(missing).await;

    ensure!(matches!(result, Err(AutomationError::ProposalNotFound(id)) if id == missing));
    Ok(())
}
