//! Runtime settings loaded from the environment.

use crate::planner::domain::{MeaningfulnessGate, PlannerSettings};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Instruction used for scheduled and manual runs.
pub const DEFAULT_UNATTENDED_INSTRUCTION: &str = "Review the repository and make one focused \
improvement that is worth committing, such as fixing a bug or filling a documentation gap. \
Avoid cosmetic-only changes.";

const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(3600);

/// Tunables of the automation runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationSettings {
    /// Context and oracle limits.
    pub planner: PlannerSettings,
    /// Period of the reconciliation sweep.
    pub reconcile_interval: Duration,
    /// Whether unattended runs stop at a pending proposal instead of
    /// applying it.
    pub review_unattended: bool,
    /// Instruction sent to the oracle on unattended runs.
    pub unattended_instruction: String,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            planner: PlannerSettings::default(),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            review_unattended: false,
            unattended_instruction: DEFAULT_UNATTENDED_INSTRUCTION.to_owned(),
        }
    }
}

impl AutomationSettings {
    /// Loads settings from `AUTOPILOT_*` environment variables.
    ///
    /// Missing variables keep their defaults. Unparsable or zero values are
    /// reported through `tracing` and also keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let planner_defaults = defaults.planner;
        let gate_defaults = planner_defaults.gate;

        let planner = PlannerSettings {
            file_byte_budget: positive(
                &lookup,
                "AUTOPILOT_FILE_BYTE_BUDGET",
                planner_defaults.file_byte_budget,
            ),
            signal_file_limit: parsed(
                &lookup,
                "AUTOPILOT_SIGNAL_FILE_LIMIT",
                planner_defaults.signal_file_limit,
            ),
            candidate_file_limit: parsed(
                &lookup,
                "AUTOPILOT_CANDIDATE_FILE_LIMIT",
                planner_defaults.candidate_file_limit,
            ),
            tree_prompt_limit: parsed(
                &lookup,
                "AUTOPILOT_TREE_PROMPT_LIMIT",
                planner_defaults.tree_prompt_limit,
            ),
            history_depth: parsed(
                &lookup,
                "AUTOPILOT_HISTORY_DEPTH",
                planner_defaults.history_depth,
            ),
            oracle_timeout: seconds(
                &lookup,
                "AUTOPILOT_ORACLE_TIMEOUT_SECS",
                planner_defaults.oracle_timeout,
            ),
            gate: MeaningfulnessGate::new(
                parsed(&lookup, "AUTOPILOT_GATE_MIN_LINES", gate_defaults.min_lines),
                parsed(&lookup, "AUTOPILOT_GATE_MIN_BYTES", gate_defaults.min_bytes),
            ),
        };

        let unattended_instruction = lookup("AUTOPILOT_UNATTENDED_INSTRUCTION")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.unattended_instruction);

        Self {
            planner,
            reconcile_interval: seconds(
                &lookup,
                "AUTOPILOT_RECONCILE_INTERVAL_SECS",
                defaults.reconcile_interval,
            ),
            review_unattended: flag(
                &lookup,
                "AUTOPILOT_REVIEW_UNATTENDED",
                defaults.review_unattended,
            ),
            unattended_instruction,
        }
    }

    /// Replaces the planner limits.
    #[must_use]
    pub const fn with_planner(mut self, planner: PlannerSettings) -> Self {
        self.planner = planner;
        self
    }

    /// Sets the reconciliation period.
    #[must_use]
    pub const fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Sets whether unattended runs wait for review.
    #[must_use]
    pub const fn with_review_unattended(mut self, review: bool) -> Self {
        self.review_unattended = review;
        self
    }

    /// Sets the unattended instruction.
    #[must_use]
    pub fn with_unattended_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.unattended_instruction = instruction.into();
        self
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "ignoring unparsable setting");
        default
    })
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match parsed(lookup, key, default) {
        0 => {
            warn!(key, "ignoring zero setting");
            default
        }
        value => value,
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Duration {
    match parsed(lookup, key, default.as_secs()) {
        0 => {
            warn!(key, "ignoring zero duration");
            default
        }
        secs => Duration::from_secs(secs),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, "ignoring unparsable flag");
            default
        }
    }
}
