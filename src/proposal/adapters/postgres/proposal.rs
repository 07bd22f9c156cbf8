//! `PostgreSQL` repository implementation for change proposals.

use super::{
    models::{NewProposalRow, ProposalChangeset, ProposalRow},
    schema::change_proposals,
};
use crate::proposal::{
    domain::{
        ChangeProposal, FileEdit, PersistedChangeProposalData, ProposalId, ProposalStatus,
        RiskLevel, UserId,
    },
    ports::{ProposalRepository, ProposalRepositoryError, ProposalRepositoryResult},
};
use crate::repository::adapters::postgres::AutomationPgPool;
use crate::repository::domain::{CommitId, RepositoryId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed proposal repository.
#[derive(Debug, Clone)]
pub struct PostgresProposalRepository {
    pool: AutomationPgPool,
}

impl PostgresProposalRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AutomationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ProposalRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ProposalRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ProposalRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ProposalRepositoryError::persistence)?
    }
}

#[async_trait]
impl ProposalRepository for PostgresProposalRepository {
    async fn store(&self, proposal: &ChangeProposal) -> ProposalRepositoryResult<()> {
        let proposal_id = proposal.id();
        let new_row = to_new_row(proposal)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(change_proposals::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProposalRepositoryError::DuplicateProposal(proposal_id)
                    }
                    _ => ProposalRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        proposal: &ChangeProposal,
        expected_revision: u64,
    ) -> ProposalRepositoryResult<()> {
        let proposal_id = proposal.id();
        let changeset = to_changeset(proposal)?;
        let expected =
            i64::try_from(expected_revision).map_err(ProposalRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                change_proposals::table
                    .filter(change_proposals::id.eq(proposal_id.into_inner()))
                    .filter(change_proposals::revision.eq(expected))
                    .filter(change_proposals::status.ne(ProposalStatus::Committed.as_str()))
                    .filter(change_proposals::status.ne(ProposalStatus::Rejected.as_str())),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(ProposalRepositoryError::persistence)?;

            if affected == 0 {
                return Err(explain_rejected_update(
                    connection,
                    proposal_id,
                    expected_revision,
                )?);
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProposalId) -> ProposalRepositoryResult<Option<ChangeProposal>> {
        self.run_blocking(move |connection| {
            let row = change_proposals::table
                .find(id.into_inner())
                .select(ProposalRow::as_select())
                .first::<ProposalRow>(connection)
                .optional()
                .map_err(ProposalRepositoryError::persistence)?;
            row.map(row_to_proposal).transpose()
        })
        .await
    }

    async fn find_by_repository(
        &self,
        repository_id: RepositoryId,
        status: Option<ProposalStatus>,
    ) -> ProposalRepositoryResult<Vec<ChangeProposal>> {
        self.run_blocking(move |connection| {
            let mut query = change_proposals::table
                .filter(change_proposals::repository_id.eq(repository_id.into_inner()))
                .select(ProposalRow::as_select())
                .order(change_proposals::created_at.desc())
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(change_proposals::status.eq(wanted.as_str()));
            }
            let rows = query
                .load::<ProposalRow>(connection)
                .map_err(ProposalRepositoryError::persistence)?;
            rows.into_iter().map(row_to_proposal).collect()
        })
        .await
    }

    async fn find_by_user(&self, user_id: UserId) -> ProposalRepositoryResult<Vec<ChangeProposal>> {
        self.run_blocking(move |connection| {
            let rows = change_proposals::table
                .filter(change_proposals::user_id.eq(user_id.into_inner()))
                .select(ProposalRow::as_select())
                .order(change_proposals::created_at.desc())
                .load::<ProposalRow>(connection)
                .map_err(ProposalRepositoryError::persistence)?;
            rows.into_iter().map(row_to_proposal).collect()
        })
        .await
    }
}

/// Works out why a guarded update touched no row.
fn explain_rejected_update(
    connection: &mut PgConnection,
    proposal_id: ProposalId,
    expected_revision: u64,
) -> ProposalRepositoryResult<ProposalRepositoryError> {
    let current = change_proposals::table
        .find(proposal_id.into_inner())
        .select(change_proposals::status)
        .first::<String>(connection)
        .optional()
        .map_err(ProposalRepositoryError::persistence)?;

    let reason = match current {
        None => ProposalRepositoryError::NotFound(proposal_id),
        Some(status)
            if ProposalStatus::try_from(status.as_str())
                .is_ok_and(ProposalStatus::is_terminal) =>
        {
            ProposalRepositoryError::Finalized(proposal_id)
        }
        Some(_) => ProposalRepositoryError::RevisionConflict {
            id: proposal_id,
            expected: expected_revision,
        },
    };
    Ok(reason)
}

fn to_new_row(proposal: &ChangeProposal) -> ProposalRepositoryResult<NewProposalRow> {
    let edits =
        serde_json::to_value(proposal.edits()).map_err(ProposalRepositoryError::persistence)?;
    let revision =
        i64::try_from(proposal.revision()).map_err(ProposalRepositoryError::persistence)?;

    Ok(NewProposalRow {
        id: proposal.id().into_inner(),
        repository_id: proposal.repository_id().into_inner(),
        user_id: proposal.user_id().map(UserId::into_inner),
        instruction: proposal.instruction().to_owned(),
        plan: proposal.plan().to_owned(),
        explanation: proposal.explanation().to_owned(),
        risk: proposal.risk().as_str().to_owned(),
        edits,
        commit_message: proposal.commit_message().to_owned(),
        status: proposal.status().as_str().to_owned(),
        commit_id: proposal.commit_id().map(|id| id.as_str().to_owned()),
        error_message: proposal.error_message().map(str::to_owned),
        revision,
        created_at: proposal.created_at(),
        updated_at: proposal.updated_at(),
    })
}

fn to_changeset(proposal: &ChangeProposal) -> ProposalRepositoryResult<ProposalChangeset> {
    let edits =
        serde_json::to_value(proposal.edits()).map_err(ProposalRepositoryError::persistence)?;
    let revision =
        i64::try_from(proposal.revision()).map_err(ProposalRepositoryError::persistence)?;

    Ok(ProposalChangeset {
        edits,
        status: proposal.status().as_str().to_owned(),
        commit_id: proposal.commit_id().map(|id| id.as_str().to_owned()),
        error_message: proposal.error_message().map(str::to_owned),
        revision,
        updated_at: proposal.updated_at(),
    })
}

fn row_to_proposal(row: ProposalRow) -> ProposalRepositoryResult<ChangeProposal> {
    let ProposalRow {
        id,
        repository_id,
        user_id,
        instruction,
        plan,
        explanation,
        risk: persisted_risk,
        edits: persisted_edits,
        commit_message,
        status: persisted_status,
        commit_id,
        error_message,
        revision: persisted_revision,
        created_at,
        updated_at,
    } = row;

    let edits = serde_json::from_value::<Vec<FileEdit>>(persisted_edits)
        .map_err(ProposalRepositoryError::persistence)?;
    let risk =
        RiskLevel::try_from(persisted_risk.as_str()).map_err(ProposalRepositoryError::persistence)?;
    let status = ProposalStatus::try_from(persisted_status.as_str())
        .map_err(ProposalRepositoryError::persistence)?;
    let revision =
        u64::try_from(persisted_revision).map_err(ProposalRepositoryError::persistence)?;

    let data = PersistedChangeProposalData {
        id: ProposalId::from_uuid(id),
        repository_id: RepositoryId::from_uuid(repository_id),
        user_id: user_id.map(UserId::from_uuid),
        instruction,
        plan,
        explanation,
        risk,
        edits,
        commit_message,
        status,
        commit_id: commit_id.map(CommitId::new),
        error_message,
        revision,
        created_at,
        updated_at,
    };
    Ok(ChangeProposal::from_persisted(data))
}
