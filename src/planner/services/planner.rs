//! Modification planner: context assembly, oracle call and proposal
//! creation.

use crate::planner::{
    domain::{
        CandidateFile, ContractViolation, GateVerdict, OracleResponse, PlannerSettings,
        ProposedEditSet, RepositoryContext, infer_primary_extension, select_signal_files,
    },
    ports::{OracleError, ReasoningOracle},
};
use crate::proposal::{
    domain::{ChangeProposal, EditAction, FileEdit, ProposalDomainError, ProposalDraft, UserId},
    ports::{ProposalRepository, ProposalRepositoryError},
};
use crate::repository::{
    domain::{RepositoryAutomationConfig, RepositoryLocator, TreeEntry},
    ports::{GatewayError, RepositoryGateway},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::prompt::{build_payload, render_prompt};

/// Errors returned by [`ModificationPlanner`].
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The instruction or resulting proposal is invalid.
    #[error(transparent)]
    Proposal(#[from] ProposalDomainError),

    /// Repository content could not be read.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The oracle call failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The oracle did not answer in time.
    #[error("oracle did not answer within {0:?}")]
    OracleTimeout(Duration),

    /// The oracle answer broke the response contract.
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),

    /// The proposal could not be persisted.
    #[error(transparent)]
    Store(#[from] ProposalRepositoryError),

    /// The prompt template failed to render.
    #[error("failed to render oracle prompt: {0}")]
    Template(String),
}

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Instruction submitted to the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    instruction: String,
    user_id: Option<UserId>,
    unattended: bool,
}

impl PlanRequest {
    /// Creates an attended request with no submitting user.
    #[must_use]
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            user_id: None,
            unattended: false,
        }
    }

    /// Sets the submitting user.
    #[must_use]
    pub const fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Marks the request as an unattended run, enabling the
    /// meaningfulness gate.
    #[must_use]
    pub const fn unattended(mut self) -> Self {
        self.unattended = true;
        self
    }

    /// Returns the instruction text.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Returns the submitting user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns whether the request comes from an unattended run.
    #[must_use]
    pub const fn is_unattended(&self) -> bool {
        self.unattended
    }
}

/// Result of planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// A pending proposal was persisted.
    Proposed(ChangeProposal),
    /// The gate rejected the edit set; nothing was persisted.
    NotMeaningful(String),
}

/// Turns instructions into persisted change proposals.
#[derive(Clone)]
pub struct ModificationPlanner<G, O, P, C>
where
    G: RepositoryGateway,
    O: ReasoningOracle,
    P: ProposalRepository,
    C: Clock + Send + Sync,
{
    gateway: Arc<G>,
    oracle: Arc<O>,
    proposals: Arc<P>,
    clock: Arc<C>,
    settings: PlannerSettings,
}

impl<G, O, P, C> ModificationPlanner<G, O, P, C>
where
    G: RepositoryGateway,
    O: ReasoningOracle,
    P: ProposalRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new planner.
    #[must_use]
    pub const fn new(
        gateway: Arc<G>,
        oracle: Arc<O>,
        proposals: Arc<P>,
        clock: Arc<C>,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            gateway,
            oracle,
            proposals,
            clock,
            settings,
        }
    }

    /// Returns the planner limits.
    #[must_use]
    pub const fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Assembles the repository context for a configured repository.
    ///
    /// An empty repository yields an empty context rather than an error.
    /// Candidate files that cannot be read are skipped, and a failing
    /// history lookup leaves the history empty.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Gateway`] when the tree cannot be listed.
    pub async fn build_context(
        &self,
        config: &RepositoryAutomationConfig,
    ) -> PlannerResult<RepositoryContext> {
        let locator = config.locator();
        let description = config.description().map(str::to_owned);
        let tree = match self.gateway.list_tree(&locator).await {
            Ok(tree) => tree,
            Err(GatewayError::RepositoryEmpty) => {
                debug!(repository = %locator, "repository has no commits");
                return Ok(RepositoryContext::empty(
                    config.full_name().clone(),
                    description,
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let signal_files = select_signal_files(&tree, self.settings.signal_file_limit);
        let primary_extension = infer_primary_extension(&tree);
        let candidate_paths = candidate_paths(
            &tree,
            &signal_files,
            primary_extension.as_deref(),
            self.settings.candidate_file_limit,
        );
        let candidate_files = self.read_candidates(&locator, candidate_paths).await;
        let recent_commits = self
            .gateway
            .recent_history(&locator, self.settings.history_depth)
            .await
            .unwrap_or_else(|err| {
                warn!(repository = %locator, error = %err, "failed to read recent history");
                Vec::new()
            });

        Ok(RepositoryContext {
            full_name: config.full_name().clone(),
            description,
            tree,
            signal_files,
            primary_extension,
            candidate_files,
            recent_commits,
        })
    }

    /// Asks the oracle for an edit set answering `instruction`.
    ///
    /// Before-content of updated and deleted files comes from the context
    /// when the file was read as a candidate, and from a fresh read
    /// otherwise. Diffs are always computed locally.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::OracleTimeout`] or [`PlannerError::Oracle`]
    /// when the oracle fails, [`PlannerError::ContractViolation`] when its
    /// answer breaks the response contract, and [`PlannerError::Gateway`]
    /// when a before-content read fails.
    pub async fn plan(
        &self,
        locator: &RepositoryLocator,
        instruction: &str,
        context: &RepositoryContext,
    ) -> PlannerResult<ProposedEditSet> {
        let prompt = render_prompt(instruction, context)?;
        let payload = build_payload(context, &self.settings);
        let timeout = self.settings.oracle_timeout;
        let raw = tokio::time::timeout(timeout, self.oracle.generate(&prompt, &payload))
            .await
            .map_err(|_elapsed| PlannerError::OracleTimeout(timeout))??;
        let response = OracleResponse::parse(raw)?;

        let mut edits = Vec::with_capacity(response.changes.len());
        for change in response.changes {
            let path = change.file_path.trim().to_owned();
            let before = match change.action {
                EditAction::Create => String::new(),
                EditAction::Update | EditAction::Delete => {
                    self.current_content(locator, context, &path, change.action)
                        .await?
                }
            };
            let after = change.modified_content.unwrap_or_default();
            edits.push(FileEdit::new(path, change.action, before, after, change.reason));
        }

        Ok(ProposedEditSet {
            plan: response.plan,
            explanation: response.explanation,
            risk: response.risk,
            commit_message: response.commit_message,
            edits,
        })
    }

    /// Plans and persists a pending proposal for `request`.
    ///
    /// Unattended requests pass the meaningfulness gate first; a rejected
    /// edit set is reported as [`PlanOutcome::NotMeaningful`] and nothing
    /// is stored.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Proposal`] for a blank instruction (before
    /// the oracle is called) or an invalid edit set, any error of
    /// [`Self::plan`], and [`PlannerError::Store`] when persistence fails.
    pub async fn propose(
        &self,
        config: &RepositoryAutomationConfig,
        context: &RepositoryContext,
        request: &PlanRequest,
    ) -> PlannerResult<PlanOutcome> {
        let instruction = request.instruction().trim();
        if instruction.is_empty() {
            return Err(ProposalDomainError::EmptyInstruction.into());
        }

        let edit_set = self.plan(&config.locator(), instruction, context).await?;
        if request.is_unattended()
            && let GateVerdict::NotMeaningful(reason) = self.settings.gate.evaluate(&edit_set.edits)
        {
            info!(
                repository_id = %config.id(),
                reason = %reason,
                "edit set rejected by meaningfulness gate"
            );
            return Ok(PlanOutcome::NotMeaningful(reason));
        }

        let proposal = ChangeProposal::new(
            ProposalDraft {
                repository_id: config.id(),
                user_id: request.user_id(),
                instruction: instruction.to_owned(),
                plan: edit_set.plan,
                explanation: edit_set.explanation,
                risk: edit_set.risk,
                edits: edit_set.edits,
                commit_message: edit_set.commit_message,
            },
            &*self.clock,
        )?;
        self.proposals.store(&proposal).await?;
        info!(
            repository_id = %config.id(),
            proposal_id = %proposal.id(),
            edits = proposal.edits().len(),
            risk = %proposal.risk(),
            "stored pending proposal"
        );
        Ok(PlanOutcome::Proposed(proposal))
    }

    async fn read_candidates(
        &self,
        locator: &RepositoryLocator,
        paths: Vec<String>,
    ) -> Vec<CandidateFile> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match self.gateway.read_file(locator, &path).await {
                Ok(snapshot) => files.push(CandidateFile {
                    path,
                    content: snapshot.content,
                }),
                Err(err) => {
                    warn!(
                        repository = %locator,
                        path = %path,
                        error = %err,
                        "skipping unreadable file"
                    );
                }
            }
        }
        files
    }

    async fn current_content(
        &self,
        locator: &RepositoryLocator,
        context: &RepositoryContext,
        path: &str,
        action: EditAction,
    ) -> PlannerResult<String> {
        if !context.contains_file(path) {
            return Err(
                ContractViolation(format!("{action} of {path}, which does not exist")).into(),
            );
        }
        if let Some(content) = context.candidate_content(path) {
            return Ok(content.to_owned());
        }
        let snapshot = self.gateway.read_file(locator, path).await?;
        Ok(snapshot.content)
    }
}

fn candidate_paths(
    tree: &[TreeEntry],
    signal_files: &[String],
    primary_extension: Option<&str>,
    limit: usize,
) -> Vec<String> {
    let language_files = primary_extension.map_or_else(Vec::new, |extension| {
        tree.iter()
            .filter(|entry| entry.is_blob())
            .filter(|entry| entry.extension().as_deref() == Some(extension))
            .filter(|entry| !signal_files.contains(&entry.path))
            .take(limit)
            .map(|entry| entry.path.clone())
            .collect()
    });
    signal_files.iter().cloned().chain(language_files).collect()
}
