//! Port for the external reasoning oracle.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for oracle calls.
pub type OracleResult<T> = Result<T, OracleError>;

/// Opaque function turning a prompt and a context payload into a
/// structured answer.
///
/// Implementations return the raw JSON answer; validation against the
/// response contract happens in the planner.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Generates an answer for `prompt` with the given context payload.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] when the oracle cannot be reached or
    /// refuses the request.
    async fn generate(&self, prompt: &str, payload: &Value) -> OracleResult<Value>;
}

/// Errors surfaced by oracle implementations.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The oracle refused the request.
    #[error("oracle rejected the request: {0}")]
    Rejected(String),

    /// The oracle could not be reached.
    #[error("oracle unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl OracleError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
