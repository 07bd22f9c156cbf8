//! Strict contract for oracle responses.
//!
//! The oracle must answer with a JSON object of this shape:
//!
//! ```json
//! {
//!   "plan": "...",
//!   "changes": [
//!     { "filePath": "src/lib.rs", "action": "update", "reason": "...", "modifiedContent": "..." }
//!   ],
//!   "commitMessage": "...",
//!   "risk": "low",
//!   "explanation": "..."
//! }
//! ```
//!
//! Unknown fields, missing fields and malformed values are violations;
//! nothing is parsed on a best-effort basis.

use crate::proposal::domain::{EditAction, FileEdit, RiskLevel};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Oracle answer that breaks the response contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("oracle contract violation: {0}")]
pub struct ContractViolation(pub String);

/// One proposed file change as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OracleChange {
    /// Repository-relative path.
    pub file_path: String,
    /// Change kind.
    pub action: EditAction,
    /// Why the change is made.
    pub reason: String,
    /// Complete new content; required for create and update.
    #[serde(default)]
    pub modified_content: Option<String>,
}

/// Structured oracle answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OracleResponse {
    /// Step-by-step plan.
    pub plan: String,
    /// Proposed changes in application order.
    pub changes: Vec<OracleChange>,
    /// Commit message for every resulting commit.
    pub commit_message: String,
    /// Risk classification.
    pub risk: RiskLevel,
    /// Explanation of the change.
    pub explanation: String,
}

impl OracleResponse {
    /// Parses and validates a raw oracle answer.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] when the value does not deserialize
    /// into the contract shape, lists no changes, has a blank commit
    /// message, contains a blank or repeated path, or omits the content of
    /// a create or update.
    pub fn parse(raw: Value) -> Result<Self, ContractViolation> {
        let response: Self =
            serde_json::from_value(raw).map_err(|err| ContractViolation(err.to_string()))?;
        response.validate()?;
        Ok(response)
    }

    fn validate(&self) -> Result<(), ContractViolation> {
        if self.changes.is_empty() {
            return Err(ContractViolation("no changes proposed".to_owned()));
        }
        if self.commit_message.trim().is_empty() {
            return Err(ContractViolation("commit message is empty".to_owned()));
        }

        let mut seen = HashSet::new();
        for change in &self.changes {
            let path = change.file_path.trim();
            if path.is_empty() {
                return Err(ContractViolation("change with empty file path".to_owned()));
            }
            if !seen.insert(path) {
                return Err(ContractViolation(format!("duplicate change for {path}")));
            }
            let needs_content = matches!(change.action, EditAction::Create | EditAction::Update);
            if needs_content && change.modified_content.is_none() {
                return Err(ContractViolation(format!(
                    "{} of {path} has no modifiedContent",
                    change.action
                )));
            }
        }
        Ok(())
    }
}

/// Validated edit set produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedEditSet {
    /// Step-by-step plan.
    pub plan: String,
    /// Explanation of the change.
    pub explanation: String,
    /// Risk classification.
    pub risk: RiskLevel,
    /// Commit message.
    pub commit_message: String,
    /// Ordered edits with freshly computed diffs.
    pub edits: Vec<FileEdit>,
}
