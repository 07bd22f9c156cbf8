//! `PostgreSQL` repository implementation for automation configurations.

use super::{
    models::{NewRepositoryConfigRow, RepositoryConfigRow},
    schema::repository_configs,
};
use crate::repository::{
    domain::{
        BranchName, PersistedRepositoryConfigData, RepositoryAutomationConfig,
        RepositoryFullName, RepositoryId,
    },
    ports::{
        AutomationConfigRepository, AutomationConfigRepositoryError,
        AutomationConfigRepositoryResult,
    },
};
use crate::schedule::{ScheduleTimeZone, parse_time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type shared by the automation adapters.
pub type AutomationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed configuration repository.
#[derive(Debug, Clone)]
pub struct PostgresAutomationConfigRepository {
    pool: AutomationPgPool,
}

impl PostgresAutomationConfigRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AutomationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AutomationConfigRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AutomationConfigRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(AutomationConfigRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AutomationConfigRepositoryError::persistence)?
    }
}

#[async_trait]
impl AutomationConfigRepository for PostgresAutomationConfigRepository {
    async fn store(
        &self,
        config: &RepositoryAutomationConfig,
    ) -> AutomationConfigRepositoryResult<()> {
        let full_name = config.full_name().clone();
        let new_row = to_new_row(config)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(repository_configs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AutomationConfigRepositoryError::DuplicateRepository(full_name.clone())
                    }
                    _ => AutomationConfigRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        config: &RepositoryAutomationConfig,
        expected_revision: u64,
    ) -> AutomationConfigRepositoryResult<()> {
        let id = config.id();
        let row = to_new_row(config)?;
        let expected = i64::try_from(expected_revision)
            .map_err(AutomationConfigRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                repository_configs::table
                    .filter(repository_configs::id.eq(id.into_inner()))
                    .filter(repository_configs::revision.eq(expected)),
            )
            .set(&row)
            .execute(connection)
            .map_err(AutomationConfigRepositoryError::persistence)?;
            if affected > 0 {
                return Ok(());
            }

            let exists = repository_configs::table
                .find(id.into_inner())
                .select(repository_configs::id)
                .first::<uuid::Uuid>(connection)
                .optional()
                .map_err(AutomationConfigRepositoryError::persistence)?
                .is_some();
            if exists {
                Err(AutomationConfigRepositoryError::RevisionConflict {
                    id,
                    expected: expected_revision,
                })
            } else {
                Err(AutomationConfigRepositoryError::NotFound(id))
            }
        })
        .await
    }

    async fn record_last_run(
        &self,
        id: RepositoryId,
        completed_at: DateTime<Utc>,
    ) -> AutomationConfigRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let affected = diesel::update(repository_configs::table.find(id.into_inner()))
                .set(repository_configs::last_run_at.eq(Some(completed_at)))
                .execute(connection)
                .map_err(AutomationConfigRepositoryError::persistence)?;
            if affected == 0 {
                return Err(AutomationConfigRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: RepositoryId) -> AutomationConfigRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let affected = diesel::delete(repository_configs::table.find(id.into_inner()))
                .execute(connection)
                .map_err(AutomationConfigRepositoryError::persistence)?;
            if affected == 0 {
                return Err(AutomationConfigRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: RepositoryId,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>> {
        self.run_blocking(move |connection| {
            let row = repository_configs::table
                .find(id.into_inner())
                .select(RepositoryConfigRow::as_select())
                .first::<RepositoryConfigRow>(connection)
                .optional()
                .map_err(AutomationConfigRepositoryError::persistence)?;
            row.map(row_to_config).transpose()
        })
        .await
    }

    async fn find_by_full_name(
        &self,
        full_name: &RepositoryFullName,
    ) -> AutomationConfigRepositoryResult<Option<RepositoryAutomationConfig>> {
        let lookup = full_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = repository_configs::table
                .filter(repository_configs::full_name.eq(lookup))
                .select(RepositoryConfigRow::as_select())
                .first::<RepositoryConfigRow>(connection)
                .optional()
                .map_err(AutomationConfigRepositoryError::persistence)?;
            row.map(row_to_config).transpose()
        })
        .await
    }

    async fn list_enabled(
        &self,
    ) -> AutomationConfigRepositoryResult<Vec<RepositoryAutomationConfig>> {
        self.run_blocking(move |connection| {
            let rows = repository_configs::table
                .filter(repository_configs::automation_enabled.eq(true))
                .order(repository_configs::created_at.asc())
                .select(RepositoryConfigRow::as_select())
                .load::<RepositoryConfigRow>(connection)
                .map_err(AutomationConfigRepositoryError::persistence)?;
            rows.into_iter().map(row_to_config).collect()
        })
        .await
    }
}

fn to_new_row(
    config: &RepositoryAutomationConfig,
) -> AutomationConfigRepositoryResult<NewRepositoryConfigRow> {
    let revision =
        i64::try_from(config.revision()).map_err(AutomationConfigRepositoryError::persistence)?;
    Ok(NewRepositoryConfigRow {
        id: config.id().into_inner(),
        full_name: config.full_name().as_str().to_owned(),
        default_branch: config.default_branch().as_str().to_owned(),
        description: config.description().map(str::to_owned),
        automation_enabled: config.automation_enabled(),
        scheduled_time: config.scheduled_time().to_string(),
        timezone: config.timezone().name().to_owned(),
        recurrence_rule: config.recurrence_rule().to_cron_expression(),
        last_run_at: config.last_run_at(),
        revision,
        created_at: config.created_at(),
        updated_at: config.updated_at(),
    })
}

fn row_to_config(
    row: RepositoryConfigRow,
) -> AutomationConfigRepositoryResult<RepositoryAutomationConfig> {
    let RepositoryConfigRow {
        id,
        full_name,
        default_branch,
        description,
        automation_enabled,
        scheduled_time,
        timezone,
        last_run_at,
        revision: persisted_revision,
        created_at,
        updated_at,
        ..
    } = row;
    let revision =
        u64::try_from(persisted_revision).map_err(AutomationConfigRepositoryError::persistence)?;

    let data = PersistedRepositoryConfigData {
        id: RepositoryId::from_uuid(id),
        full_name: RepositoryFullName::new(full_name)
            .map_err(AutomationConfigRepositoryError::persistence)?,
        default_branch: BranchName::new(default_branch)
            .map_err(AutomationConfigRepositoryError::persistence)?,
        description,
        automation_enabled,
        scheduled_time: parse_time(&scheduled_time)
            .map_err(AutomationConfigRepositoryError::persistence)?,
        timezone: ScheduleTimeZone::new(timezone)
            .map_err(AutomationConfigRepositoryError::persistence)?,
        last_run_at,
        revision,
        created_at,
        updated_at,
    };
    Ok(RepositoryAutomationConfig::from_persisted(data))
}
