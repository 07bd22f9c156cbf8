//! Tunables bounding the context sent to the oracle.

use super::MeaningfulnessGate;
use std::time::Duration;

/// Limits applied while assembling context and calling the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    /// Maximum bytes of each candidate file sent to the oracle.
    pub file_byte_budget: usize,
    /// Maximum number of signal files read.
    pub signal_file_limit: usize,
    /// Maximum number of primary-language files read.
    pub candidate_file_limit: usize,
    /// Maximum number of tree paths listed in the payload.
    pub tree_prompt_limit: usize,
    /// Number of recent commits included in the payload.
    pub history_depth: usize,
    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
    /// Thresholds for unattended runs.
    pub gate: MeaningfulnessGate,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            file_byte_budget: 3000,
            signal_file_limit: 5,
            candidate_file_limit: 10,
            tree_prompt_limit: 50,
            history_depth: 5,
            oracle_timeout: Duration::from_secs(120),
            gate: MeaningfulnessGate::default(),
        }
    }
}
