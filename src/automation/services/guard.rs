//! Per-repository reentrancy guard.

use crate::repository::domain::RepositoryId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of repositories with a run in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightRuns {
    active: Arc<Mutex<HashSet<RepositoryId>>>,
}

impl InFlightRuns {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `repository_id` as running.
    ///
    /// Returns `None` when a run for the repository is already in flight.
    /// The mark is released when the returned guard drops.
    #[must_use]
    pub fn try_acquire(&self, repository_id: RepositoryId) -> Option<RunGuard> {
        lock(&self.active).insert(repository_id).then(|| RunGuard {
            repository_id,
            active: Arc::clone(&self.active),
        })
    }

    /// Returns whether a run for `repository_id` is in flight.
    #[must_use]
    pub fn is_running(&self, repository_id: RepositoryId) -> bool {
        lock(&self.active).contains(&repository_id)
    }
}

/// Releases the in-flight mark on drop.
#[derive(Debug)]
pub struct RunGuard {
    repository_id: RepositoryId,
    active: Arc<Mutex<HashSet<RepositoryId>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.repository_id);
    }
}

// The set holds plain identifiers, so a poisoned lock is still usable.
fn lock(active: &Mutex<HashSet<RepositoryId>>) -> MutexGuard<'_, HashSet<RepositoryId>> {
    active
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
