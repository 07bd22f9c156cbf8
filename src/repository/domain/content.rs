//! Value types exchanged with the repository content gateway.

use super::{BranchName, RepositoryFullName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one branch of one remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryLocator {
    full_name: RepositoryFullName,
    branch: BranchName,
}

impl RepositoryLocator {
    /// Creates a locator for `branch` of `full_name`.
    #[must_use]
    pub const fn new(full_name: RepositoryFullName, branch: BranchName) -> Self {
        Self { full_name, branch }
    }

    /// Returns the repository name.
    #[must_use]
    pub const fn full_name(&self) -> &RepositoryFullName {
        &self.full_name
    }

    /// Returns the branch.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }
}

impl fmt::Display for RepositoryLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.full_name, self.branch)
    }
}

/// Optimistic-concurrency token identifying one version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentToken(String);

impl ContentToken {
    /// Wraps a gateway-issued token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a commit created by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wraps a remote commit identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File content read from the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Repository-relative path.
    pub path: String,
    /// Full text content.
    pub content: String,
    /// Token required to update or delete this version.
    pub token: ContentToken,
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Commit created by the write.
    pub commit_id: CommitId,
    /// Token of the newly written version.
    pub token: ContentToken,
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeEntryKind {
    /// Regular file.
    Blob,
    /// Directory.
    Tree,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Repository-relative path.
    pub path: String,
    /// Entry kind.
    pub kind: TreeEntryKind,
    /// Size in bytes; zero for directories.
    pub size: u64,
}

impl TreeEntry {
    /// Creates a blob entry.
    #[must_use]
    pub fn blob(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Blob,
            size,
        }
    }

    /// Creates a directory entry.
    #[must_use]
    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Tree,
            size: 0,
        }
    }

    /// Returns whether the entry is a regular file.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self.kind, TreeEntryKind::Blob)
    }

    /// Returns the file name component of the path.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Returns whether the entry sits at the repository root.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('/')
    }

    /// Returns the lower-cased extension of the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (stem, extension) = self.file_name().rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }
}

/// Summary of one commit in recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Commit identifier.
    pub id: CommitId,
    /// Commit message.
    pub message: String,
}
