//! In-memory integration tests for attended instructions and review.

use super::helpers::{README, Stack, installation_answer};
use mockable::DefaultClock;
use repo_autopilot::automation::{domain::AutomationSettings, services::ErrorKind};
use repo_autopilot::proposal::domain::{
    ChangeProposal, EditAction, ProposalStatus, RunStatus, RunTrigger,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn stack() -> Stack<DefaultClock> {
    Stack::new(&AutomationSettings::default())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_proposal_is_committed_once(
    stack: Stack<DefaultClock>,
) -> Result<(), eyre::Report> {
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(installation_answer());

    let proposal = stack
        .service
        .submit_instruction(config.id(), "Document installation", None)
        .await?;
    let edit = proposal
        .edits()
        .first()
        .ok_or_else(|| eyre::eyre!("proposal should carry an edit"))?;
    eyre::ensure!(edit.action() == EditAction::Update);
    eyre::ensure!(edit.before() == README);
    eyre::ensure!(edit.diff().contains("+## Installation"));
    eyre::ensure!(edit.stats().additions > 0);

    let outcome = stack.service.approve_proposal(proposal.id()).await?;
    eyre::ensure!(outcome.proposal.status() == ProposalStatus::Committed);
    eyre::ensure!(outcome.proposal.commit_id() == Some(&outcome.last_commit_id));

    let again = stack.service.approve_proposal(proposal.id()).await;
    eyre::ensure!(again.err().map(|err| err.kind()) == Some(ErrorKind::Conflict));
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1, "approval should log once");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_proposal_leaves_repository_untouched(
    stack: Stack<DefaultClock>,
) -> Result<(), eyre::Report> {
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(installation_answer());
    let proposal = stack
        .service
        .submit_instruction(config.id(), "Document installation", None)
        .await?;

    let rejected = stack.service.reject_proposal(proposal.id()).await?;

    eyre::ensure!(rejected.status() == ProposalStatus::Rejected);
    eyre::ensure!(stack.file(&config, "README.md")? == README);
    eyre::ensure!(stack.service.list_pending(config.id()).await?.is_empty());
    let approve = stack.service.approve_proposal(proposal.id()).await;
    eyre::ensure!(approve.err().map(|err| err.kind()) == Some(ErrorKind::Conflict));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creating_an_existing_path_fails_and_stays_pending(
    stack: Stack<DefaultClock>,
) -> Result<(), eyre::Report> {
    let config = stack
        .service
        .connect_repository("octo/widgets", "main", None)
        .await?;
    stack.seed(&config)?;
    stack.oracle.push_answer(json!({
        "plan": "Add a changelog",
        "changes": [{
            "filePath": "CHANGELOG.md",
            "action": "create",
            "reason": "Track releases",
            "modifiedContent": "# Changelog\n"
        }],
        "commitMessage": "Add changelog",
        "risk": "low",
        "explanation": "Releases are untracked"
    }));
    let proposal = stack
        .service
        .submit_instruction(config.id(), "Add a changelog", None)
        .await?;
    stack
        .gateway
        .seed_file(&config.locator(), "CHANGELOG.md", "# Changes\n")?;

    let result = stack.service.approve_proposal(proposal.id()).await;

    eyre::ensure!(result.is_err(), "approval should fail");
    let pending = stack.service.list_pending(config.id()).await?;
    eyre::ensure!(pending.iter().map(ChangeProposal::id).eq([proposal.id()]));
    eyre::ensure!(stack.file(&config, "CHANGELOG.md")? == "# Changes\n");
    let runs = stack.service.list_runs(config.id(), 5).await?;
    eyre::ensure!(runs.len() == 1);
    eyre::ensure!(runs
        .iter()
        .all(|run| run.status() == RunStatus::Failed && run.trigger() == RunTrigger::Review));
    Ok(())
}
