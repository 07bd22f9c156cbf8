//! `PostgreSQL` repository implementation for the run log.

use super::{
    models::{NewRunLogRow, RunLogRow},
    schema::automation_run_logs,
};
use crate::proposal::{
    domain::{
        AutomationRunLog, PersistedRunLogData, ProposalId, RunLogId, RunStatus, RunTrigger,
    },
    ports::{RunLogRepository, RunLogRepositoryError, RunLogRepositoryResult},
};
use crate::repository::adapters::postgres::AutomationPgPool;
use crate::repository::domain::{CommitId, RepositoryId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed run log.
#[derive(Debug, Clone)]
pub struct PostgresRunLogRepository {
    pool: AutomationPgPool,
}

impl PostgresRunLogRepository {
    /// Creates a new run log from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AutomationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RunLogRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RunLogRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RunLogRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RunLogRepositoryError::persistence)?
    }
}

#[async_trait]
impl RunLogRepository for PostgresRunLogRepository {
    async fn append(&self, log: &AutomationRunLog) -> RunLogRepositoryResult<()> {
        let log_id = log.id();
        let new_row = to_new_row(log)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(automation_run_logs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RunLogRepositoryError::DuplicateRunLog(log_id)
                    }
                    _ => RunLogRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
        limit: usize,
    ) -> RunLogRepositoryResult<Vec<AutomationRunLog>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = automation_run_logs::table
                .filter(automation_run_logs::repository_id.eq(repository_id.into_inner()))
                .order(automation_run_logs::created_at.desc())
                .limit(row_limit)
                .select(RunLogRow::as_select())
                .load::<RunLogRow>(connection)
                .map_err(RunLogRepositoryError::persistence)?;
            rows.into_iter().map(row_to_run_log).collect()
        })
        .await
    }
}

fn to_new_row(log: &AutomationRunLog) -> RunLogRepositoryResult<NewRunLogRow> {
    let files_changed =
        serde_json::to_value(log.files_changed()).map_err(RunLogRepositoryError::persistence)?;

    Ok(NewRunLogRow {
        id: log.id().into_inner(),
        repository_id: log.repository_id().into_inner(),
        proposal_id: log.proposal_id().map(ProposalId::into_inner),
        run_trigger: log.trigger().as_str().to_owned(),
        status: log.status().as_str().to_owned(),
        commit_id: log.commit_id().map(|id| id.as_str().to_owned()),
        commit_message: log.commit_message().to_owned(),
        files_changed,
        analysis: log.analysis().to_owned(),
        error_detail: log.error_detail().map(str::to_owned),
        created_at: log.created_at(),
    })
}

fn row_to_run_log(row: RunLogRow) -> RunLogRepositoryResult<AutomationRunLog> {
    let RunLogRow {
        id,
        repository_id,
        proposal_id,
        run_trigger,
        status: persisted_status,
        commit_id,
        commit_message,
        files_changed: persisted_files,
        analysis,
        error_detail,
        created_at,
    } = row;

    let trigger =
        RunTrigger::try_from(run_trigger.as_str()).map_err(RunLogRepositoryError::persistence)?;
    let status =
        RunStatus::try_from(persisted_status.as_str()).map_err(RunLogRepositoryError::persistence)?;
    let files_changed = serde_json::from_value::<Vec<String>>(persisted_files)
        .map_err(RunLogRepositoryError::persistence)?;

    let data = PersistedRunLogData {
        id: RunLogId::from_uuid(id),
        repository_id: RepositoryId::from_uuid(repository_id),
        proposal_id: proposal_id.map(ProposalId::from_uuid),
        trigger,
        status,
        commit_id: commit_id.map(CommitId::new),
        commit_message,
        files_changed,
        analysis,
        error_detail,
        created_at,
    };
    Ok(AutomationRunLog::from_persisted(data))
}
