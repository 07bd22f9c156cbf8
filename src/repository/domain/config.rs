//! Repository automation configuration aggregate.

use super::{BranchName, RepositoryFullName, RepositoryId, RepositoryLocator};
use crate::schedule::{DailyTime, RecurrenceRule, ScheduleTimeZone, next_fire_instant};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Automation settings of one connected repository.
///
/// The recurrence rule is never stored on its own; it is always derived
/// from the scheduled time and timezone. Every user-facing change bumps
/// the revision so stores can reject writes based on a stale read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAutomationConfig {
    id: RepositoryId,
    full_name: RepositoryFullName,
    default_branch: BranchName,
    description: Option<String>,
    automation_enabled: bool,
    scheduled_time: DailyTime,
    timezone: ScheduleTimeZone,
    last_run_at: Option<DateTime<Utc>>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRepositoryConfigData {
    /// Persisted repository identifier.
    pub id: RepositoryId,
    /// Persisted `owner/repo` name.
    pub full_name: RepositoryFullName,
    /// Persisted default branch.
    pub default_branch: BranchName,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted automation flag.
    pub automation_enabled: bool,
    /// Persisted daily time.
    pub scheduled_time: DailyTime,
    /// Persisted timezone.
    pub timezone: ScheduleTimeZone,
    /// Persisted timestamp of the last successful run.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Persisted optimistic-concurrency revision.
    pub revision: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RepositoryAutomationConfig {
    /// Creates a newly connected repository with automation disabled,
    /// scheduled at midnight UTC.
    #[must_use]
    pub fn new(
        full_name: RepositoryFullName,
        default_branch: BranchName,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: RepositoryId::new(),
            full_name,
            default_branch,
            description: None,
            automation_enabled: false,
            scheduled_time: DailyTime::MIDNIGHT,
            timezone: ScheduleTimeZone::utc(),
            last_run_at: None,
            revision: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the repository description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reconstructs a configuration from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRepositoryConfigData) -> Self {
        Self {
            id: data.id,
            full_name: data.full_name,
            default_branch: data.default_branch,
            description: data.description,
            automation_enabled: data.automation_enabled,
            scheduled_time: data.scheduled_time,
            timezone: data.timezone,
            last_run_at: data.last_run_at,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the repository identifier.
    #[must_use]
    pub const fn id(&self) -> RepositoryId {
        self.id
    }

    /// Returns the `owner/repo` name.
    #[must_use]
    pub const fn full_name(&self) -> &RepositoryFullName {
        &self.full_name
    }

    /// Returns the default branch.
    #[must_use]
    pub const fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether scheduled automation is enabled.
    #[must_use]
    pub const fn automation_enabled(&self) -> bool {
        self.automation_enabled
    }

    /// Returns the daily fire time.
    #[must_use]
    pub const fn scheduled_time(&self) -> DailyTime {
        self.scheduled_time
    }

    /// Returns the schedule timezone.
    #[must_use]
    pub const fn timezone(&self) -> &ScheduleTimeZone {
        &self.timezone
    }

    /// Returns the timestamp of the last successful run.
    #[must_use]
    pub const fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    /// Returns the optimistic-concurrency revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Derives the recurrence rule from the scheduled time.
    #[must_use]
    pub const fn recurrence_rule(&self) -> RecurrenceRule {
        self.scheduled_time.recurrence_rule()
    }

    /// Returns the gateway address of the default branch.
    #[must_use]
    pub fn locator(&self) -> RepositoryLocator {
        RepositoryLocator::new(self.full_name.clone(), self.default_branch.clone())
    }

    /// Computes the first fire instant strictly after `now`.
    #[must_use]
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_fire_instant(self.scheduled_time, &self.timezone, now)
    }

    /// Turns scheduled automation on.
    pub fn enable(&mut self, clock: &impl Clock) {
        self.automation_enabled = true;
        self.touch(clock);
    }

    /// Turns scheduled automation off.
    pub fn disable(&mut self, clock: &impl Clock) {
        self.automation_enabled = false;
        self.touch(clock);
    }

    /// Replaces the daily time and timezone.
    pub fn update_schedule(
        &mut self,
        scheduled_time: DailyTime,
        timezone: ScheduleTimeZone,
        clock: &impl Clock,
    ) {
        self.scheduled_time = scheduled_time;
        self.timezone = timezone;
        self.touch(clock);
    }

    /// Records the completion time of a successful run.
    ///
    /// Run bookkeeping is not a user change, so neither the revision nor
    /// `updated_at` moves.
    pub const fn record_run(&mut self, completed_at: DateTime<Utc>) {
        self.last_run_at = Some(completed_at);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.revision = self.revision.saturating_add(1);
        self.updated_at = clock.utc();
    }
}
