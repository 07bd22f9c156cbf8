//! Tests for the meaningfulness gate.

use crate::planner::domain::{GateVerdict, MeaningfulnessGate};
use crate::proposal::domain::{EditAction, FileEdit};
use rstest::rstest;

fn update(before: &str, after: &str) -> FileEdit {
    FileEdit::new("notes.md", EditAction::Update, before, after, "Tweak")
}

#[rstest]
fn one_line_ten_byte_change_is_not_meaningful() {
    let edit = FileEdit::new("notes.md", EditAction::Create, "", "todo: fix\n", "Add");

    let verdict = MeaningfulnessGate::default().evaluate(&[edit]);

    assert!(matches!(
        verdict,
        GateVerdict::NotMeaningful(ref reason) if reason.contains("below meaningfulness threshold")
    ));
}

#[rstest]
fn unchanged_content_is_not_meaningful() {
    let verdict = MeaningfulnessGate::default().evaluate(&[update("same\n", "same\n")]);

    assert!(matches!(verdict, GateVerdict::NotMeaningful(_)));
}

#[rstest]
#[case::many_lines("a\n", "a\nb\nc\nd\n")]
#[case::many_bytes("short\n", "a considerably longer line that adds well over fifty bytes\n")]
#[case::shrinking("a\nb\nc\nd\ne\n", "a\n")]
fn large_line_or_byte_deltas_are_meaningful(#[case] before: &str, #[case] after: &str) {
    assert_eq!(
        MeaningfulnessGate::default().evaluate(&[update(before, after)]),
        GateVerdict::Meaningful
    );
}

#[rstest]
fn multi_file_sets_are_not_gated() {
    let edits = [update("a\n", "b\n"), update("c\n", "d\n")];

    assert_eq!(
        MeaningfulnessGate::default().evaluate(&edits),
        GateVerdict::Meaningful
    );
}

#[rstest]
fn thresholds_are_configurable() {
    let gate = MeaningfulnessGate::new(1, 1);

    assert_eq!(gate.evaluate(&[update("a\n", "ab\n")]), GateVerdict::Meaningful);
}
