//! In-memory content gateway with SHA-256 content tokens.
//!
//! Besides serving as a local stand-in for a remote store, the gateway
//! supports failure injection per path and for tree listings.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::repository::{
    domain::{
        CommitId, CommitSummary, ContentToken, FileSnapshot, RepositoryLocator, TreeEntry,
        WriteReceipt,
    },
    ports::{GatewayError, GatewayResult, RepositoryGateway},
};

/// Thread-safe in-memory repository gateway.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepositoryGateway {
    state: Arc<RwLock<GatewayState>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    branches: HashMap<RepositoryLocator, BranchState>,
    failing_paths: HashSet<String>,
    fail_tree_listing: bool,
    commit_counter: u64,
}

#[derive(Debug, Default)]
struct BranchState {
    files: BTreeMap<String, String>,
    history: Vec<CommitSummary>,
}

/// Computes the token of a file version.
fn content_token(content: &str) -> ContentToken {
    ContentToken::new(format!("{:x}", Sha256::digest(content.as_bytes())))
}

fn poisoned(err: impl ToString) -> GatewayError {
    GatewayError::transport(std::io::Error::other(err.to_string()))
}

fn injected(path: &str) -> GatewayError {
    GatewayError::transport(std::io::Error::other(format!(
        "injected failure for {path}"
    )))
}

impl GatewayState {
    fn commit(&mut self, repo: &RepositoryLocator, path: &str, message: &str) -> CommitId {
        self.commit_counter += 1;
        let seed = format!("{}:{repo}:{path}:{message}", self.commit_counter);
        let commit_id = CommitId::new(format!("{:x}", Sha256::digest(seed.as_bytes())));
        self.branches
            .entry(repo.clone())
            .or_default()
            .history
            .push(CommitSummary {
                id: commit_id.clone(),
                message: message.to_owned(),
            });
        commit_id
    }

    fn check_injected(&self, path: &str) -> GatewayResult<()> {
        if self.failing_paths.contains(path) {
            return Err(injected(path));
        }
        Ok(())
    }
}

impl InMemoryRepositoryGateway {
    /// Creates a gateway with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a file directly, recording a seed commit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the state lock is poisoned.
    pub fn seed_file(
        &self,
        repo: &RepositoryLocator,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> GatewayResult<()> {
        let path_value = path.into();
        let mut state = self.state.write().map_err(poisoned)?;
        let message = format!("Seed {path_value}");
        state.commit(repo, &path_value, &message);
        state
            .branches
            .entry(repo.clone())
            .or_default()
            .files
            .insert(path_value, content.into());
        Ok(())
    }

    /// Returns the current content of a file, if present.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the state lock is poisoned.
    pub fn file(&self, repo: &RepositoryLocator, path: &str) -> GatewayResult<Option<String>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .branches
            .get(repo)
            .and_then(|branch| branch.files.get(path))
            .cloned())
    }

    /// Returns the number of commits recorded on a branch.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the state lock is poisoned.
    pub fn commit_count(&self, repo: &RepositoryLocator) -> GatewayResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .branches
            .get(repo)
            .map_or(0, |branch| branch.history.len()))
    }

    /// Makes every write or deletion of `path` fail with a transport error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the state lock is poisoned.
    pub fn fail_writes_to(&self, path: impl Into<String>) -> GatewayResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.failing_paths.insert(path.into());
        Ok(())
    }

    /// Makes tree listings fail with a transport error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the state lock is poisoned.
    pub fn fail_tree_listing(&self) -> GatewayResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.fail_tree_listing = true;
        Ok(())
    }
}

#[async_trait]
impl RepositoryGateway for InMemoryRepositoryGateway {
    async fn read_file(
        &self,
        repo: &RepositoryLocator,
        path: &str,
    ) -> GatewayResult<FileSnapshot> {
        let state = self.state.read().map_err(poisoned)?;
        let content = state
            .branches
            .get(repo)
            .and_then(|branch| branch.files.get(path))
            .ok_or_else(|| GatewayError::NotFound(path.to_owned()))?;
        Ok(FileSnapshot {
            path: path.to_owned(),
            content: content.clone(),
            token: content_token(content),
        })
    }

    async fn write_file(
        &self,
        repo: &RepositoryLocator,
        path: &str,
        content: &str,
        message: &str,
        token: Option<&ContentToken>,
    ) -> GatewayResult<WriteReceipt> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.check_injected(path)?;

        let current = state
            .branches
            .get(repo)
            .and_then(|branch| branch.files.get(path));
        match (current, token) {
            (Some(_), None) => return Err(GatewayError::Conflict(path.to_owned())),
            (None, Some(_)) => return Err(GatewayError::NotFound(path.to_owned())),
            (Some(existing), Some(expected)) if content_token(existing) != *expected => {
                return Err(GatewayError::Conflict(path.to_owned()));
            }
            _ => {}
        }

        let commit_id = state.commit(repo, path, message);
        state
            .branches
            .entry(repo.clone())
            .or_default()
            .files
            .insert(path.to_owned(), content.to_owned());
        Ok(WriteReceipt {
            commit_id,
            token: content_token(content),
        })
    }

    async fn delete_file(
        &self,
        repo: &RepositoryLocator,
        path: &str,
        message: &str,
        token: &ContentToken,
    ) -> GatewayResult<CommitId> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.check_injected(path)?;

        let current = state
            .branches
            .get(repo)
            .and_then(|branch| branch.files.get(path))
            .ok_or_else(|| GatewayError::NotFound(path.to_owned()))?;
        if content_token(current) != *token {
            return Err(GatewayError::Conflict(path.to_owned()));
        }

        let commit_id = state.commit(repo, path, message);
        if let Some(branch) = state.branches.get_mut(repo) {
            branch.files.remove(path);
        }
        Ok(commit_id)
    }

    async fn list_tree(&self, repo: &RepositoryLocator) -> GatewayResult<Vec<TreeEntry>> {
        let state = self.state.read().map_err(poisoned)?;
        if state.fail_tree_listing {
            return Err(injected("tree"));
        }

        let files = match state.branches.get(repo) {
            Some(branch) if !branch.files.is_empty() => &branch.files,
            _ => return Err(GatewayError::RepositoryEmpty),
        };

        let mut seen_dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for (path, content) in files {
            let parents = path
                .match_indices('/')
                .filter_map(|(index, _)| path.get(..index));
            for dir in parents {
                if seen_dirs.insert(dir.to_owned()) {
                    entries.push(TreeEntry::tree(dir));
                }
            }
            let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
            entries.push(TreeEntry::blob(path.clone(), size));
        }
        Ok(entries)
    }

    async fn recent_history(
        &self,
        repo: &RepositoryLocator,
        limit: usize,
    ) -> GatewayResult<Vec<CommitSummary>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .branches
            .get(repo)
            .map(|branch| branch.history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
