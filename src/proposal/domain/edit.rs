//! File-level edits carried by a change proposal.

use super::ParseProposalValueError;
use crate::diff::{DiffStats, diff_with_stats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change applied to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// The file does not exist yet.
    Create,
    /// The file exists and its content is replaced.
    Update,
    /// The file is removed.
    Delete,
}

impl EditAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl TryFrom<&str> for EditAction {
    type Error = ParseProposalValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(ParseProposalValueError::new("edit action", value)),
        }
    }
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file-level change within a proposal.
///
/// The diff is derived from the before and after content on construction
/// and on deserialization; a stored diff is never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FileEditRecord")]
pub struct FileEdit {
    path: String,
    action: EditAction,
    before: String,
    after: String,
    diff: String,
    stats: DiffStats,
    reason: String,
    apply_error: Option<String>,
}

#[derive(Deserialize)]
struct FileEditRecord {
    path: String,
    action: EditAction,
    before: String,
    after: String,
    reason: String,
    #[serde(default)]
    apply_error: Option<String>,
}

impl From<FileEditRecord> for FileEdit {
    fn from(record: FileEditRecord) -> Self {
        let mut edit = Self::new(
            record.path,
            record.action,
            record.before,
            record.after,
            record.reason,
        );
        edit.apply_error = record.apply_error;
        edit
    }
}

impl FileEdit {
    /// Creates an edit, normalizing content for the action and computing
    /// its diff.
    ///
    /// A `create` always starts from empty content and a `delete` always
    /// ends with empty content.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        action: EditAction,
        before: impl Into<String>,
        after: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let path_value = path.into();
        let before_content = match action {
            EditAction::Create => String::new(),
            EditAction::Update | EditAction::Delete => before.into(),
        };
        let after_content = match action {
            EditAction::Delete => String::new(),
            EditAction::Create | EditAction::Update => after.into(),
        };
        let (diff, stats) = diff_with_stats(&path_value, &before_content, &after_content);

        Self {
            path: path_value,
            action,
            before: before_content,
            after: after_content,
            diff,
            stats,
            reason: reason.into(),
            apply_error: None,
        }
    }

    /// Returns the repository-relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the edit action.
    #[must_use]
    pub const fn action(&self) -> EditAction {
        self.action
    }

    /// Returns the content before the edit.
    #[must_use]
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Returns the content after the edit.
    #[must_use]
    pub fn after(&self) -> &str {
        &self.after
    }

    /// Returns the unified diff.
    #[must_use]
    pub fn diff(&self) -> &str {
        &self.diff
    }

    /// Returns the diff statistics.
    #[must_use]
    pub const fn stats(&self) -> DiffStats {
        self.stats
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the error of the last failed apply attempt, if any.
    #[must_use]
    pub fn apply_error(&self) -> Option<&str> {
        self.apply_error.as_deref()
    }

    pub(super) fn set_apply_error(&mut self, error: Option<String>) {
        self.apply_error = error;
    }
}
