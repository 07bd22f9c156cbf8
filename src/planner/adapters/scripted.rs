//! Oracle that replays queued answers, for tests and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::planner::ports::{OracleError, OracleResult, ReasoningOracle};

/// A recorded oracle invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleCall {
    /// Rendered prompt.
    pub prompt: String,
    /// Context payload.
    pub payload: Value,
}

#[derive(Debug, Default)]
struct ScriptState {
    answers: VecDeque<OracleResult<Value>>,
    calls: Vec<OracleCall>,
}

/// Oracle answering from a queue of scripted results.
///
/// Answers are consumed in order. Once the queue is exhausted every call
/// is rejected.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedOracle {
    /// Creates an oracle with no queued answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful answer.
    pub fn push_answer(&self, answer: Value) {
        self.push(Ok(answer));
    }

    /// Queues a failure.
    pub fn push_failure(&self, error: OracleError) {
        self.push(Err(error));
    }

    /// Returns the invocations seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<OracleCall> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    fn push(&self, answer: OracleResult<Value>) {
        match self.state.lock() {
            Ok(mut state) => state.answers.push_back(answer),
            Err(poisoned) => poisoned.into_inner().answers.push_back(answer),
        }
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str, payload: &Value) -> OracleResult<Value> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| OracleError::Rejected(err.to_string()))?;
        state.calls.push(OracleCall {
            prompt: prompt.to_owned(),
            payload: payload.clone(),
        });
        state
            .answers
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Rejected("no scripted answer left".to_owned())))
    }
}
