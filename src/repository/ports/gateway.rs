//! Port for reading and writing remote repository content.

use crate::repository::domain::{
    CommitId, CommitSummary, ContentToken, FileSnapshot, RepositoryLocator, TreeEntry,
    WriteReceipt,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Content-store view of a remote repository.
///
/// Every write creates one commit. Updates and deletions must present the
/// token of the version they replace.
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Reads a file and its current token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the path does not exist.
    async fn read_file(&self, repo: &RepositoryLocator, path: &str)
    -> GatewayResult<FileSnapshot>;

    /// Creates (`token` absent) or updates (`token` present) a file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] when creating an existing path or
    /// when the token is stale, and [`GatewayError::NotFound`] when updating
    /// a missing path.
    async fn write_file(
        &self,
        repo: &RepositoryLocator,
        path: &str,
        content: &str,
        message: &str,
        token: Option<&ContentToken>,
    ) -> GatewayResult<WriteReceipt>;

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for a missing path and
    /// [`GatewayError::Conflict`] for a stale token.
    async fn delete_file(
        &self,
        repo: &RepositoryLocator,
        path: &str,
        message: &str,
        token: &ContentToken,
    ) -> GatewayResult<CommitId>;

    /// Lists every entry of the branch recursively, in tree order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RepositoryEmpty`] when the branch has no
    /// commits yet.
    async fn list_tree(&self, repo: &RepositoryLocator) -> GatewayResult<Vec<TreeEntry>>;

    /// Returns up to `limit` commits, newest first.
    async fn recent_history(
        &self,
        repo: &RepositoryLocator,
        limit: usize,
    ) -> GatewayResult<Vec<CommitSummary>>;
}

/// Errors surfaced by gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The path does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The token is stale or the path already exists.
    #[error("write conflict on {0}")]
    Conflict(String),

    /// The repository has no commits yet.
    #[error("repository is empty")]
    RepositoryEmpty,

    /// Network or remote-store failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
