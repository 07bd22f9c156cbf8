//! Unified diffs and line statistics between two text blobs.
//!
//! Output is deterministic: identical inputs always render byte-identical
//! diffs, so diffs can be recomputed from stored content at any time.

use serde::{Deserialize, Serialize};
use similar::TextDiff;

/// Unchanged lines shown around each hunk.
const CONTEXT_RADIUS: usize = 3;

/// Added and removed line counts of a unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Lines added by the diff.
    pub additions: usize,
    /// Lines removed by the diff.
    pub deletions: usize,
}

impl DiffStats {
    /// Returns the total number of changed lines.
    #[must_use]
    pub const fn changes(self) -> usize {
        self.additions + self.deletions
    }
}

/// Renders a unified diff of `before` against `after` for `path`.
///
/// Identical inputs produce an empty string. Otherwise the output starts
/// with `--- a/<path>` and `+++ b/<path>` header lines followed by hunks.
///
/// # Examples
///
/// ```
/// use repo_autopilot::diff::{diff, stats};
///
/// let text = diff("notes.txt", "one\n", "one\ntwo\n");
/// assert!(text.starts_with("--- a/notes.txt\n+++ b/notes.txt\n"));
/// assert_eq!(stats(&text).additions, 1);
/// ```
#[must_use]
pub fn diff(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    let text_diff = TextDiff::from_lines(before, after);
    text_diff
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header(&old_header, &new_header)
        .to_string()
}

/// Counts added and removed lines in a unified diff.
///
/// Header lines before the first hunk are ignored, so content lines that
/// themselves begin with `++` or `--` are still counted.
#[must_use]
pub fn stats(diff_text: &str) -> DiffStats {
    let mut counted = DiffStats::default();
    let mut in_hunk = false;

    for line in diff_text.lines() {
        if line.starts_with("@@") {
            in_hunk = true;
        } else if in_hunk {
            if line.starts_with('+') {
                counted.additions += 1;
            } else if line.starts_with('-') {
                counted.deletions += 1;
            }
        }
    }

    counted
}

/// Diffs two blobs and returns the rendered text with its statistics.
#[must_use]
pub fn diff_with_stats(path: &str, before: &str, after: &str) -> (String, DiffStats) {
    let text = diff(path, before, after);
    let counted = stats(&text);
    (text, counted)
}
