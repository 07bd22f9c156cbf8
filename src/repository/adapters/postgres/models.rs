//! Diesel row models for repository configuration persistence.

use super::schema::repository_configs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for repository configurations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = repository_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RepositoryConfigRow {
    /// Internal repository identifier.
    pub id: uuid::Uuid,
    /// Remote `owner/repo` name.
    pub full_name: String,
    /// Default branch.
    pub default_branch: String,
    /// Optional description.
    pub description: Option<String>,
    /// Automation flag.
    pub automation_enabled: bool,
    /// Daily fire time.
    pub scheduled_time: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Derived cron expression.
    pub recurrence_rule: String,
    /// Last successful run.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for repository configurations.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = repository_configs)]
#[diesel(treat_none_as_null = true)]
pub struct NewRepositoryConfigRow {
    /// Internal repository identifier.
    pub id: uuid::Uuid,
    /// Remote `owner/repo` name.
    pub full_name: String,
    /// Default branch.
    pub default_branch: String,
    /// Optional description.
    pub description: Option<String>,
    /// Automation flag.
    pub automation_enabled: bool,
    /// Daily fire time.
    pub scheduled_time: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Derived cron expression.
    pub recurrence_rule: String,
    /// Last successful run.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
