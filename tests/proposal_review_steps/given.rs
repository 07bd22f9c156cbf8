//! Given steps for proposal review BDD scenarios.

use super::world::{ReviewWorld, SEEDED_README, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"a connected repository "{name}" with a README"#)]
fn connected_repository_with_readme(
    world: &mut ReviewWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let config = run_async(world.service.connect_repository(&name, "main", None))
        .wrap_err("connect repository for scenario")?;
    let locator = config.locator();
    world
        .gateway
        .seed_file(&locator, "README.md", SEEDED_README)?;
    world
        .gateway
        .seed_file(&locator, "src/lib.rs", "pub fn widget() {}\n")?;
    world.config = Some(config);
    Ok(())
}

#[given(r#"a connected repository "{name}" without files"#)]
fn connected_empty_repository(world: &mut ReviewWorld, name: String) -> Result<(), eyre::Report> {
    let config = run_async(world.service.connect_repository(&name, "main", None))
        .wrap_err("connect empty repository for scenario")?;
    world.config = Some(config);
    Ok(())
}

#[given("the oracle proposes documenting installation")]
fn oracle_proposes_installation(world: &mut ReviewWorld) {
    world.oracle.push_answer(json!({
        "plan": "Document installation",
        "changes": [{
            "filePath": "README.md",
            "action": "update",
            "reason": "Setup steps are missing",
            "modifiedContent": "# Widgets\n\nSmall widget toolkit.\n\n## Installation\n\n\
                                Add `widgets` to your manifest.\n\n## Usage\n\nCall `widget()`.\n"
        }],
        "commitMessage": "Document installation",
        "risk": "low",
        "explanation": "New users need setup steps"
    }));
}

#[given("the oracle proposes a cosmetic README tweak")]
fn oracle_proposes_cosmetic_tweak(world: &mut ReviewWorld) {
    world.oracle.push_answer(json!({
        "plan": "Punctuation",
        "changes": [{
            "filePath": "README.md",
            "action": "update",
            "reason": "Excitement",
            "modifiedContent": "# Widgets\n\nSmall widget toolkit!\n"
        }],
        "commitMessage": "Punctuation",
        "risk": "low",
        "explanation": "Cosmetic"
    }));
}
