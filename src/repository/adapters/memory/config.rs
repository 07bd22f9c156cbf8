//! In-memory configuration repository for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::repository::{
    domain::{RepositoryAutomationConfig, RepositoryFullName, RepositoryId},
    ports::{
        AutomationConfigRepository, AutomationConfigRepositoryError,
        AutomationConfigRepositoryResult,
    },
};

/// Thread-safe in-memory configuration repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAutomationConfigRepository {
    state: Arc<RwLock<HashMap<RepositoryId, RepositoryAutomationConfig>>>,
}

impl InMemoryAutomationConfigRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> AutomationConfigRepositoryError {
    AutomationConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AutomationConfigRepository for InMemoryAutomationConfigRepository {
    async fn store(
        &self,
        config: &RepositoryAutomationConfig,
    ) -> AutomationConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let already_connected = state
            .values()
            .any(|existing| existing.full_name() == config.full_name());
        if already_connected || state.contains_key(&config.id()) {
            return Err(AutomationConfigRepositoryError::DuplicateRepository(
                config.full_name().clone(),
            ));
        }
        state.insert(config.id(), config.clone());
        Ok(())
    }

    async fn update(
        &self,
        config: &RepositoryAutomationConfig,
        expected_revision: u64,
    ) -> AutomationConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let slot = state
            .get_mut(&config.id())
            .ok_or(AutomationConfigRepositoryError::NotFound(config.id()))?;
        if slot.revision() != expected_revision {
            return Err(AutomationConfigRepositoryError::RevisionConflict {
                id: config.id(),
                expected: expected_revision,
            });
        }
        *slot = config.clone();
        Ok(())
    }

    async fn record_last_run(
        &self,
        id: RepositoryId,
        completed_at: DateTime<Utc>,
    ) -> AutomationConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let slot = state
            .get_mut(&id)
            .ok_or(AutomationConfigRepositoryError::NotFound(id))?;
        slot.record_run(completed_at);
        Ok(())
    }

    async fn delete(&self, id: RepositoryId) -> AutomationConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state
            .remove(&id)
            .map(|_| ())
            .ok_or(AutomationConfigRepositoryError::NotFound(id))
    }

    async fn find_by_id(
        &self,
        id: RepositoryId,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(&id).cloned())
    }

    async fn find_by_full_name(
        &self,
        full_name: &RepositoryFullName,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .values()
            .find(|config| config.full_name() == full_name)
            .cloned())
    }

    async fn list_enabled(
        &self,
    ) -> AutomationConfigRepositoryResult<Vec<RepositoryAutomationConfig>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut enabled: Vec<_> = state
            .values()
            .filter(|config| config.automation_enabled())
            .cloned()
            .collect();
        enabled.sort_by_key(RepositoryAutomationConfig::created_at);
        Ok(enabled)
    }
}
