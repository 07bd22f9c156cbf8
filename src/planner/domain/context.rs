//! Bounded view of a repository handed to the oracle.

use crate::repository::domain::{CommitSummary, RepositoryFullName, TreeEntry};
use std::collections::HashMap;

/// Exact top-level file names treated as signal files, compared
/// case-insensitively.
const SIGNAL_FILE_NAMES: [&str; 9] = [
    "readme",
    "readme.md",
    "package.json",
    "requirements.txt",
    "tsconfig.json",
    "cargo.toml",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
];

/// Suffixes of top-level tool configuration files such as
/// `vite.config.ts`.
const SIGNAL_FILE_SUFFIXES: [&str; 2] = [".config.js", ".config.ts"];

/// One file read for the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Repository-relative path.
    pub path: String,
    /// Full content as read from the gateway.
    pub content: String,
}

/// Repository context assembled before planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// Repository name.
    pub full_name: RepositoryFullName,
    /// Repository description, if any.
    pub description: Option<String>,
    /// Full recursive tree in gateway order.
    pub tree: Vec<TreeEntry>,
    /// Signal file paths in tree order.
    pub signal_files: Vec<String>,
    /// Most frequent blob extension, if any blob has one.
    pub primary_extension: Option<String>,
    /// Files read for the oracle: signal files first, then
    /// primary-language files.
    pub candidate_files: Vec<CandidateFile>,
    /// Recent commits, newest first.
    pub recent_commits: Vec<CommitSummary>,
}

impl RepositoryContext {
    /// Creates the context of a repository with no content.
    #[must_use]
    pub const fn empty(full_name: RepositoryFullName, description: Option<String>) -> Self {
        Self {
            full_name,
            description,
            tree: Vec::new(),
            signal_files: Vec::new(),
            primary_extension: None,
            candidate_files: Vec::new(),
            recent_commits: Vec::new(),
        }
    }

    /// Returns whether the repository has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.tree.iter().any(TreeEntry::is_blob)
    }

    /// Returns the inferred primary language name.
    #[must_use]
    pub fn primary_language(&self) -> &str {
        self.primary_extension
            .as_deref()
            .map_or("unknown", language_for_extension)
    }

    /// Returns whether `path` is a file of the repository.
    #[must_use]
    pub fn contains_file(&self, path: &str) -> bool {
        self.tree
            .iter()
            .any(|entry| entry.is_blob() && entry.path == path)
    }

    /// Returns the content of `path` when it was read as a candidate.
    #[must_use]
    pub fn candidate_content(&self, path: &str) -> Option<&str> {
        self.candidate_files
            .iter()
            .find(|file| file.path == path)
            .map(|file| file.content.as_str())
    }
}

/// Returns whether a tree entry is a manifest, readme or tool config file
/// at the repository root.
#[must_use]
pub fn is_signal_file(entry: &TreeEntry) -> bool {
    if !entry.is_blob() || !entry.is_top_level() {
        return false;
    }
    let name = entry.file_name().to_ascii_lowercase();
    SIGNAL_FILE_NAMES.contains(&name.as_str())
        || SIGNAL_FILE_SUFFIXES
            .iter()
            .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Returns up to `limit` signal file paths in tree order.
#[must_use]
pub fn select_signal_files(tree: &[TreeEntry], limit: usize) -> Vec<String> {
    tree.iter()
        .filter(|entry| is_signal_file(entry))
        .take(limit)
        .map(|entry| entry.path.clone())
        .collect()
}

/// Infers the most frequent extension among blobs.
///
/// Ties go to the extension encountered first in tree order.
#[must_use]
pub fn infer_primary_extension(tree: &[TreeEntry]) -> Option<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, extension) in tree
        .iter()
        .filter(|entry| entry.is_blob())
        .filter_map(TreeEntry::extension)
        .enumerate()
    {
        counts.entry(extension).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (left_count, left_first)), (_, (right_count, right_first))| {
            left_count
                .cmp(right_count)
                .then_with(|| right_first.cmp(left_first))
        })
        .map(|(extension, _)| extension)
}

/// Maps a file extension to a language name.
///
/// Unknown extensions map to themselves.
#[must_use]
pub fn language_for_extension(extension: &str) -> &str {
    match extension {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "c" | "h" => "c",
        "swift" => "swift",
        "md" => "markdown",
        "sh" => "shell",
        other => other,
    }
}
