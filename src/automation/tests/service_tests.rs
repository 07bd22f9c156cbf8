//! Facade tests covering repository lifecycle and proposal review.

use super::fixtures::{World, meaningful_update, trivial_update};
use crate::automation::domain::{AutomationSettings, RunReport};
use crate::automation::services::ErrorKind;
use crate::proposal::domain::{ChangeProposal, ProposalStatus, RunStatus, RunTrigger, UserId};
use crate::repository::domain::RepositoryId;
use crate::schedule::{DailyTime, ScheduleTimeZone};
use chrono::Utc;
use eyre::{Result, bail, ensure};
use rstest::{fixture, rstest};
use uuid::Uuid;

#[fixture]
fn world() -> World {
    World::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connected_repository_starts_disabled_at_midnight_utc(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());

    let config = service
        .connect_repository("octo/widgets", "main", Some("  Widget toolkit  "))
        .await?;

    ensure!(!config.automation_enabled());
    ensure!(config.scheduled_time() == DailyTime::MIDNIGHT);
    ensure!(config.timezone() == &ScheduleTimeZone::utc());
    ensure!(config.description() == Some("Widget toolkit"));
    let status = service.automation_status(config.id()).await?;
    ensure!(!status.scheduled);
    ensure!(status.next_fire.is_none());
    Ok(())
}

#[rstest]
#[case("octo", "main", ErrorKind::Validation)]
#[case("octo/widgets", "  ", ErrorKind::Validation)]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_connection_is_rejected(
    world: World,
    #[case] name: &str,
    #[case] branch: &str,
    #[case] expected: ErrorKind,
) -> Result<()> {
    let service = world.service(&AutomationSettings::default());

    let result = service.connect_repository(name, branch, None).await;

    ensure!(result.err().map(|err| err.kind()) == Some(expected));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connecting_twice_conflicts(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    service.connect_repository("octo/widgets", "main", None).await?;

    let result = service.connect_repository("octo/widgets", "main", None).await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Conflict));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn enabling_and_disabling_toggle_the_job(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service.connect_repository("octo/widgets", "main", None).await?;

    let enabled = service.enable_automation(config.id()).await?;
    let scheduled = service.automation_status(config.id()).await?;
    let disabled = service.disable_automation(config.id()).await?;
    let unscheduled = service.automation_status(config.id()).await?;

    ensure!(enabled.automation_enabled());
    ensure!(scheduled.scheduled);
    ensure!(scheduled.next_fire.is_some_and(|next| next > Utc::now()));
    ensure!(!disabled.automation_enabled());
    ensure!(!unscheduled.scheduled);
    ensure!(!unscheduled.config.automation_enabled());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disable_racing_a_sweep_leaves_no_job(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service.connect_repository("octo/widgets", "main", None).await?;
    service.enable_automation(config.id()).await?;
    service.scheduler().forget_job(config.id());

    let (swept, disabled) = tokio::join!(
        service.scheduler().run_reconciliation_sweep(),
        service.disable_automation(config.id()),
    );

    swept?;
    ensure!(!disabled?.automation_enabled());
    ensure!(service.scheduler().job(config.id()).is_none());
    ensure!(service.scheduler().run_reconciliation_sweep().await? == 0);
    ensure!(service.scheduler().jobs().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn schedule_update_replaces_the_job(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service.connect_repository("octo/widgets", "main", None).await?;
    service.enable_automation(config.id()).await?;

    let update = service
        .update_schedule(config.id(), "09:30", "Europe/Berlin")
        .await?;

    ensure!(update.recurrence_rule.to_cron_expression() == "30 9 * * *");
    ensure!(update.config.timezone().name() == "Europe/Berlin");
    let jobs = service.scheduler().jobs();
    ensure!(jobs.len() == 1);
    ensure!(jobs.iter().all(|job| job.next_fire == update.next_fire
        && job.scheduled_time == update.config.scheduled_time()));
    Ok(())
}

#[rstest]
#[case("25:00", "UTC")]
#[case("9:30", "UTC")]
#[case("09:30", "Mars/Olympus")]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_schedule_changes_nothing(
    world: World,
    #[case] time: &str,
    #[case] zone: &str,
) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service.connect_repository("octo/widgets", "main", None).await?;

    let result = service.update_schedule(config.id(), time, zone).await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Validation));
    let status = service.automation_status(config.id()).await?;
    ensure!(status.config == config);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_repository_is_not_found(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let missing = RepositoryId::new();

    let status = service.automation_status(missing).await;
    let schedule = service.update_schedule(missing, "09:30", "UTC").await;
    let enable = service.enable_automation(missing).await;

    ensure!(status.err().map(|err| err.kind()) == Some(ErrorKind::NotFound));
    ensure!(schedule.err().map(|err| err.kind()) == Some(ErrorKind::NotFound));
    ensure!(enable.err().map(|err| err.kind()) == Some(ErrorKind::NotFound));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trigger_now_runs_a_manual_pass(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service
        .connect_repository("octo/widgets", "main", Some("Widget toolkit"))
        .await?;

    let report = service.trigger_now(config.id()).await?;
    let runs = service.list_runs(config.id(), 10).await?;

    ensure!(matches!(report, RunReport::Bootstrapped { .. }));
    ensure!(runs.len() == 1);
    ensure!(runs
        .iter()
        .all(|run| run.trigger() == RunTrigger::Manual && run.status() == RunStatus::Success));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submitted_instruction_is_reviewed(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(meaningful_update());
    let user = UserId::from_uuid(Uuid::new_v4());

    let proposal = service
        .submit_instruction(config.id(), "Document installation", Some(user))
        .await?;

    ensure!(proposal.status() == ProposalStatus::Pending);
    ensure!(proposal.user_id() == Some(user));
    let pending = service.list_pending(config.id()).await?;
    ensure!(pending.iter().map(ChangeProposal::id).eq([proposal.id()]));

    let rejected = service.reject_proposal(proposal.id()).await?;
    let again = service.reject_proposal(proposal.id()).await?;
    ensure!(rejected.status() == ProposalStatus::Rejected);
    ensure!(again == rejected);
    ensure!(service.list_pending(config.id()).await?.is_empty());

    let approve = service.approve_proposal(proposal.id()).await;
    let Err(err) = approve else {
        bail!("approving a rejected proposal should fail");
    };
    ensure!(err.kind() == ErrorKind::Conflict);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attended_trivial_instruction_is_kept(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;
    world.oracle.push_answer(trivial_update());

    let proposal = service
        .submit_instruction(config.id(), "Use an exclamation mark", None)
        .await?;

    ensure!(proposal.status() == ProposalStatus::Pending);
    let outcome = service.approve_proposal(proposal.id()).await?;
    ensure!(outcome.proposal.status() == ProposalStatus::Committed);
    ensure!(outcome.committed_files == vec!["README.md".to_owned()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_instruction_is_a_validation_error(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = world.connect(None).await?;
    world.seed_readme(&config)?;

    let result = service.submit_instruction(config.id(), "   ", None).await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Validation));
    ensure!(world.oracle.calls().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disconnect_removes_configuration_and_job(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    let config = service.connect_repository("octo/widgets", "main", None).await?;
    service.enable_automation(config.id()).await?;

    service.disconnect_repository(config.id()).await?;

    ensure!(service.scheduler().job(config.id()).is_none());
    let status = service.automation_status(config.id()).await;
    ensure!(status.err().map(|err| err.kind()) == Some(ErrorKind::NotFound));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_schedules_enabled_repositories(world: World) -> Result<()> {
    let service = world.service(&AutomationSettings::default());
    world.connect(None).await?;
    service.connect_repository("octo/gadgets", "main", None).await?;

    let scheduled = service.start().await?;

    ensure!(scheduled == 1);
    ensure!(service.scheduler().is_running());
    service.stop();
    ensure!(!service.scheduler().is_running());
    Ok(())
}
