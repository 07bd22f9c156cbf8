//! Heuristic filter for trivial unattended changes.

use crate::proposal::domain::FileEdit;

/// Outcome of the meaningfulness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// The edit set is worth committing.
    Meaningful,
    /// The edit set is too small; carries the reason.
    NotMeaningful(String),
}

/// Rejects single-file changes whose line and byte deltas are both small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeaningfulnessGate {
    /// Minimum absolute change in line count.
    pub min_lines: usize,
    /// Minimum absolute change in byte length.
    pub min_bytes: usize,
}

impl Default for MeaningfulnessGate {
    fn default() -> Self {
        Self {
            min_lines: 3,
            min_bytes: 50,
        }
    }
}

impl MeaningfulnessGate {
    /// Creates a gate with explicit thresholds.
    #[must_use]
    pub const fn new(min_lines: usize, min_bytes: usize) -> Self {
        Self {
            min_lines,
            min_bytes,
        }
    }

    /// Evaluates an edit set.
    ///
    /// Only single-edit sets are gated. Such an edit fails when its content
    /// is unchanged, or when the line-count delta is below `min_lines` and
    /// the byte-length delta is below `min_bytes`.
    #[must_use]
    pub fn evaluate(&self, edits: &[FileEdit]) -> GateVerdict {
        let [edit] = edits else {
            return GateVerdict::Meaningful;
        };

        if edit.before() == edit.after() {
            return GateVerdict::NotMeaningful(format!("{} is unchanged", edit.path()));
        }

        let line_delta = edit
            .before()
            .lines()
            .count()
            .abs_diff(edit.after().lines().count());
        let byte_delta = edit.before().len().abs_diff(edit.after().len());
        if line_delta < self.min_lines && byte_delta < self.min_bytes {
            return GateVerdict::NotMeaningful(format!(
                "change to {} is below meaningfulness threshold ({line_delta} lines, {byte_delta} bytes)",
                edit.path()
            ));
        }

        GateVerdict::Meaningful
    }
}
