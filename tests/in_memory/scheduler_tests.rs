//! In-memory integration tests for timers driving the pipeline.
//!
//! Tokio time is paused and the pipeline clock is frozen just before the
//! scheduled instant, so each timer fires exactly once per test.

use super::helpers::{FixedClock, Stack, march_first};
use repo_autopilot::automation::domain::AutomationSettings;
use repo_autopilot::proposal::domain::{RunStatus, RunTrigger};
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[tokio::test(start_paused = true)]
async fn scheduled_fire_bootstraps_empty_repository() -> Result<(), eyre::Report> {
    let stack = Stack::with_clock(
        FixedClock(march_first(9, 29, 0)),
        &AutomationSettings::default(),
    );
    let config = stack
        .service
        .connect_repository("octo/fresh", "main", None)
        .await?;
    stack.service.enable_automation(config.id()).await?;
    let update = stack
        .service
        .update_schedule(config.id(), "09:30", "UTC")
        .await?;
    eyre::ensure!(update.next_fire == march_first(9, 30, 0));

    tokio::time::sleep(Duration::from_secs(120)).await;

    eyre::ensure!(stack.file(&config, "README.md")?.starts_with("# fresh"));
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1, "expected one run, found {}", runs.len());
    eyre::ensure!(runs
        .iter()
        .all(|run| run.trigger() == RunTrigger::Scheduled && run.status() == RunStatus::Success));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn local_time_is_honoured_across_zones() -> Result<(), eyre::Report> {
    let stack = Stack::with_clock(
        FixedClock(march_first(8, 29, 0)),
        &AutomationSettings::default(),
    );
    let config = stack
        .service
        .connect_repository("octo/fresh", "main", None)
        .await?;
    stack.service.enable_automation(config.id()).await?;

    // Berlin is one hour ahead of UTC in early March.
    let update = stack
        .service
        .update_schedule(config.id(), "09:30", "Europe/Berlin")
        .await?;
    eyre::ensure!(update.next_fire == march_first(8, 30, 0));

    tokio::time::sleep(Duration::from_secs(120)).await;

    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1, "expected one run, found {}", runs.len());
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn disabling_before_the_fire_prevents_the_run() -> Result<(), eyre::Report> {
    let stack = Stack::with_clock(
        FixedClock(march_first(9, 29, 0)),
        &AutomationSettings::default(),
    );
    let config = stack
        .service
        .connect_repository("octo/fresh", "main", None)
        .await?;
    stack.service.enable_automation(config.id()).await?;
    stack
        .service
        .update_schedule(config.id(), "09:30", "UTC")
        .await?;

    stack.service.disable_automation(config.id()).await?;
    tokio::time::sleep(Duration::from_secs(120)).await;

    eyre::ensure!(stack.file(&config, "README.md")?.is_empty());
    eyre::ensure!(stack.service.list_runs(config.id(), 5).await?.is_empty());
    let status = stack.service.automation_status(config.id()).await?;
    eyre::ensure!(!status.scheduled);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn start_restores_jobs_after_stop() -> Result<(), eyre::Report> {
    let stack = Stack::with_clock(
        FixedClock(march_first(12, 0, 0)),
        &AutomationSettings::default(),
    );
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.service.enable_automation(config.id()).await?;

    stack.service.stop();
    let stopped = stack.service.automation_status(config.id()).await?;
    let scheduled = stack.service.start().await?;
    let restored = stack.service.automation_status(config.id()).await?;

    eyre::ensure!(!stopped.scheduled);
    eyre::ensure!(scheduled == 1);
    eyre::ensure!(restored.scheduled);
    eyre::ensure!(restored.next_fire == Some(march_first(0, 0, 0) + chrono::TimeDelta::days(1)));
    stack.service.stop();
    Ok(())
}
