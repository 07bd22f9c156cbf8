//! Diesel row models for proposal and run-log persistence.

use super::schema::{automation_run_logs, change_proposals};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for change proposals.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = change_proposals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProposalRow {
    /// Internal proposal identifier.
    pub id: uuid::Uuid,
    /// Target repository identifier.
    pub repository_id: uuid::Uuid,
    /// Submitting user.
    pub user_id: Option<uuid::Uuid>,
    /// Instruction.
    pub instruction: String,
    /// Plan.
    pub plan: String,
    /// Explanation.
    pub explanation: String,
    /// Risk classification.
    pub risk: String,
    /// Ordered file edits.
    pub edits: Value,
    /// Commit message.
    pub commit_message: String,
    /// Lifecycle state.
    pub status: String,
    /// Last commit created on application.
    pub commit_id: Option<String>,
    /// Aggregate error of the last failed attempt.
    pub error_message: Option<String>,
    /// Optimistic-concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for change proposals.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = change_proposals)]
pub struct NewProposalRow {
    /// Internal proposal identifier.
    pub id: uuid::Uuid,
    /// Target repository identifier.
    pub repository_id: uuid::Uuid,
    /// Submitting user.
    pub user_id: Option<uuid::Uuid>,
    /// Instruction.
    pub instruction: String,
    /// Plan.
    pub plan: String,
    /// Explanation.
    pub explanation: String,
    /// Risk classification.
    pub risk: String,
    /// Ordered file edits.
    pub edits: Value,
    /// Commit message.
    pub commit_message: String,
    /// Lifecycle state.
    pub status: String,
    /// Last commit created on application.
    pub commit_id: Option<String>,
    /// Aggregate error of the last failed attempt.
    pub error_message: Option<String>,
    /// Optimistic-concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Mutable proposal columns written by lifecycle updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = change_proposals)]
#[diesel(treat_none_as_null = true)]
pub struct ProposalChangeset {
    /// Ordered file edits with their apply errors.
    pub edits: Value,
    /// Lifecycle state.
    pub status: String,
    /// Last commit created on application.
    pub commit_id: Option<String>,
    /// Aggregate error of the last failed attempt.
    pub error_message: Option<String>,
    /// New revision.
    pub revision: i64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for run logs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = automation_run_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RunLogRow {
    /// Internal run identifier.
    pub id: uuid::Uuid,
    /// Repository identifier.
    pub repository_id: uuid::Uuid,
    /// Applied proposal.
    pub proposal_id: Option<uuid::Uuid>,
    /// Trigger.
    pub run_trigger: String,
    /// Outcome.
    pub status: String,
    /// Resulting commit.
    pub commit_id: Option<String>,
    /// Commit message.
    pub commit_message: String,
    /// Touched paths.
    pub files_changed: Value,
    /// Analysis.
    pub analysis: String,
    /// Failure detail.
    pub error_detail: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for run logs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = automation_run_logs)]
pub struct NewRunLogRow {
    /// Internal run identifier.
    pub id: uuid::Uuid,
    /// Repository identifier.
    pub repository_id: uuid::Uuid,
    /// Applied proposal.
    pub proposal_id: Option<uuid::Uuid>,
    /// Trigger.
    pub run_trigger: String,
    /// Outcome.
    pub status: String,
    /// Resulting commit.
    pub commit_id: Option<String>,
    /// Commit message.
    pub commit_message: String,
    /// Touched paths.
    pub files_changed: Value,
    /// Analysis.
    pub analysis: String,
    /// Failure detail.
    pub error_detail: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
