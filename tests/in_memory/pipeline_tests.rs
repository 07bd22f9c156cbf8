//! In-memory integration tests for unattended pipeline runs.

use super::helpers::{README, Stack, cosmetic_answer, installation_answer, two_file_answer};
use repo_autopilot::automation::domain::{AutomationSettings, RunReport};
use repo_autopilot::proposal::domain::{RunStatus, RunTrigger};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_repository_receives_generated_readme() -> Result<(), eyre::Report> {
    let stack = Stack::new(&AutomationSettings::default());
    let config = stack
        .service
        .connect_repository("octo/fresh", "main", Some("Fresh start"))
        .await?;

    let report = stack.service.trigger_now(config.id()).await?;

    eyre::ensure!(
        matches!(report, RunReport::Bootstrapped { .. }),
        "unexpected report {report:?}"
    );
    let readme = stack.file(&config, "README.md")?;
    eyre::ensure!(readme.starts_with("# fresh"));
    eyre::ensure!(readme.contains("Fresh start"));
    eyre::ensure!(readme.contains("*This README was auto-generated*"));

    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1, "expected one run, found {}", runs.len());
    let status = stack.service.automation_status(config.id()).await?;
    eyre::ensure!(status.config.last_run_at().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unattended_run_commits_meaningful_change() -> Result<(), eyre::Report> {
    let stack = Stack::new(&AutomationSettings::default());
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(installation_answer());

    let report = stack.service.trigger_now(config.id()).await?;

    eyre::ensure!(report.commit_id().is_some(), "unexpected report {report:?}");
    eyre::ensure!(stack.file(&config, "README.md")?.contains("## Installation"));
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1);
    eyre::ensure!(runs.iter().all(|run| run.status() == RunStatus::Success
        && run.trigger() == RunTrigger::Manual
        && run.commit_id() == report.commit_id()));

    let calls = stack.oracle.calls();
    eyre::ensure!(calls.len() == 1);
    eyre::ensure!(calls.iter().all(|call| {
        call.payload.get("repository").and_then(serde_json::Value::as_str)
            == Some("octo/widgets")
    }));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_failure_commits_remaining_edits() -> Result<(), eyre::Report> {
    let stack = Stack::new(&AutomationSettings::default());
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.gateway.fail_writes_to("docs/guide.md")?;
    stack.oracle.push_answer(two_file_answer());

    let report = stack.service.trigger_now(config.id()).await?;

    let RunReport::Committed {
        committed_files,
        failed_files,
        ..
    } = report
    else {
        return Err(eyre::eyre!("expected a commit, got {report:?}"));
    };
    eyre::ensure!(committed_files == vec!["README.md".to_owned()]);
    eyre::ensure!(failed_files == vec!["docs/guide.md".to_owned()]);
    eyre::ensure!(stack.file(&config, "docs/guide.md")?.is_empty());

    let runs = stack.service.list_runs(config.id(), 5).await?;
    let run = runs
        .first()
        .ok_or_else(|| eyre::eyre!("expected a run log entry"))?;
    eyre::ensure!(run.files_changed() == ["README.md".to_owned()]);
    eyre::ensure!(run.analysis().contains("failed edits: docs/guide.md"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cosmetic_change_is_not_committed() -> Result<(), eyre::Report> {
    let stack = Stack::new(&AutomationSettings::default());
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(cosmetic_answer());

    let report = stack.service.trigger_now(config.id()).await?;

    eyre::ensure!(matches!(report, RunReport::NotMeaningful { .. }));
    eyre::ensure!(stack.file(&config, "README.md")? == README);
    eyre::ensure!(stack.service.list_pending(config.id()).await?.is_empty());
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.iter().all(|run| run.status() == RunStatus::Failed));
    eyre::ensure!(runs.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_mode_parks_unattended_proposals() -> Result<(), eyre::Report> {
    let stack = Stack::new(&AutomationSettings::default().with_review_unattended(true));
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(installation_answer());

    let report = stack.service.trigger_now(config.id()).await?;
    let RunReport::AwaitingReview { proposal_id } = report else {
        return Err(eyre::eyre!("expected a parked proposal, got {report:?}"));
    };
    eyre::ensure!(stack.file(&config, "README.md")? == README);
    eyre::ensure!(stack.service.list_runs(config.id(), 5).await?.is_empty());

    stack.service.approve_proposal(proposal_id).await?;

    eyre::ensure!(stack.file(&config, "README.md")?.contains("## Installation"));
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1);
    eyre::ensure!(runs.iter().all(|run| run.trigger() == RunTrigger::Review));
    Ok(())
}
