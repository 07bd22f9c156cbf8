//! When steps for proposal review BDD scenarios.

use super::world::{ReviewWorld, run_async};
use rstest_bdd_macros::when;

#[when(r#"the instruction "{instruction}" is submitted"#)]
fn submit_instruction(world: &mut ReviewWorld, instruction: String) -> Result<(), eyre::Report> {
    let repository_id = world.config()?.id();
    let proposal = run_async(
        world
            .service
            .submit_instruction(repository_id, &instruction, None),
    )
    .map_err(|err| eyre::eyre!("submission failed: {err}"))?;
    world.proposal = Some(proposal);
    Ok(())
}

#[when("the pending proposal is approved")]
fn approve_pending_proposal(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let proposal_id = world.proposal()?.id();
    let outcome = run_async(world.service.approve_proposal(proposal_id))
        .map_err(|err| eyre::eyre!("approval failed: {err}"))?;
    world.proposal = Some(outcome.proposal);
    Ok(())
}

#[when("the pending proposal is rejected")]
fn reject_pending_proposal(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let proposal_id = world.proposal()?.id();
    let rejected = run_async(world.service.reject_proposal(proposal_id))
        .map_err(|err| eyre::eyre!("rejection failed: {err}"))?;
    world.proposal = Some(rejected);
    Ok(())
}

#[when("an unattended run is triggered")]
fn trigger_unattended_run(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let repository_id = world.config()?.id();
    let report = run_async(world.service.trigger_now(repository_id))
        .map_err(|err| eyre::eyre!("run failed: {err}"))?;
    world.last_report = Some(report);
    Ok(())
}
