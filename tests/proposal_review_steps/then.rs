//! Then steps for proposal review BDD scenarios.

use super::world::{ReviewWorld, SEEDED_README, run_async};
use repo_autopilot::automation::{domain::RunReport, services::ErrorKind};
use repo_autopilot::proposal::domain::{AutomationRunLog, RunStatus, RunTrigger};
use rstest_bdd_macros::then;

fn latest_run(world: &ReviewWorld) -> Result<AutomationRunLog, eyre::Report> {
    let repository_id = world.config()?.id();
    let runs = run_async(world.service.list_runs(repository_id, 1))
        .map_err(|err| eyre::eyre!("list_runs failed: {err}"))?;
    runs.into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("expected at least one run log entry"))
}

fn ensure_pending(world: &ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let repository_id = world.config()?.id();
    let pending = run_async(world.service.list_pending(repository_id))
        .map_err(|err| eyre::eyre!("list_pending failed: {err}"))?;
    if pending.len() != count {
        return Err(eyre::eyre!(
            "expected {count} pending proposals, found {}",
            pending.len()
        ));
    }
    Ok(())
}

#[then("{count:usize} proposal is pending")]
fn single_proposal_pending(world: &mut ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    ensure_pending(world, count)
}

#[then("{count:usize} proposals are pending")]
fn proposals_pending(world: &mut ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    ensure_pending(world, count)
}

#[then(r#"the README contains "{text}""#)]
fn readme_contains(world: &mut ReviewWorld, text: String) -> Result<(), eyre::Report> {
    let readme = world.readme()?;
    if !readme.contains(&text) {
        return Err(eyre::eyre!("expected README to contain '{text}', got {readme:?}"));
    }
    Ok(())
}

#[then("the README is unchanged")]
fn readme_unchanged(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let readme = world.readme()?;
    if readme != SEEDED_README {
        return Err(eyre::eyre!("README changed to {readme:?}"));
    }
    Ok(())
}

#[then("approving the proposal again fails with a conflict")]
fn approving_again_conflicts(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let proposal_id = world.proposal()?.id();
    let result = run_async(world.service.approve_proposal(proposal_id));
    match result {
        Err(err) if err.kind() == ErrorKind::Conflict => {
            world.last_approval_error = Some(err);
            Ok(())
        }
        other => Err(eyre::eyre!("expected a conflict, got {other:?}")),
    }
}

#[then("the run is reported as not meaningful")]
fn run_not_meaningful(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    match &world.last_report {
        Some(RunReport::NotMeaningful { .. }) => Ok(()),
        other => Err(eyre::eyre!("expected a not-meaningful report, got {other:?}")),
    }
}

#[then("the latest run was a successful review run")]
fn latest_run_successful_review(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let run = latest_run(world)?;
    if run.status() != RunStatus::Success || run.trigger() != RunTrigger::Review {
        return Err(eyre::eyre!(
            "expected a successful review run, got {} {}",
            run.status(),
            run.trigger()
        ));
    }
    Ok(())
}

#[then("the latest run succeeded")]
fn latest_run_succeeded(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let run = latest_run(world)?;
    if run.status() != RunStatus::Success {
        return Err(eyre::eyre!("expected a successful run, got {}", run.status()));
    }
    Ok(())
}

#[then("the latest run failed")]
fn latest_run_failed(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let run = latest_run(world)?;
    if run.status() != RunStatus::Failed {
        return Err(eyre::eyre!("expected a failed run, got {}", run.status()));
    }
    Ok(())
}
