//! Shared wiring for in-memory integration tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::{Clock, DefaultClock};
use repo_autopilot::automation::{
    domain::AutomationSettings,
    services::{AutomationPorts, AutomationService},
};
use repo_autopilot::planner::adapters::ScriptedOracle;
use repo_autopilot::proposal::adapters::memory::{
    InMemoryProposalRepository, InMemoryRunLogRepository,
};
use repo_autopilot::repository::{
    adapters::memory::{InMemoryAutomationConfigRepository, InMemoryRepositoryGateway},
    domain::RepositoryAutomationConfig,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Service type wired with in-memory adapters.
pub type TestService<C> = AutomationService<
    InMemoryAutomationConfigRepository,
    InMemoryRepositoryGateway,
    ScriptedOracle,
    InMemoryProposalRepository,
    InMemoryRunLogRepository,
    C,
>;

/// README seeded into non-empty repositories.
pub const README: &str = "# Widgets\n\nSmall widget toolkit.\n";

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns the instant `hour:minute:second` UTC on 2024-03-01.
#[must_use]
pub fn march_first(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, second)
        .single()
        .unwrap_or_default()
}

/// The service plus the adapter handles tests inspect.
pub struct Stack<C: Clock + Send + Sync + 'static> {
    /// Service under test.
    pub service: TestService<C>,
    /// Repository content.
    pub gateway: Arc<InMemoryRepositoryGateway>,
    /// Scripted oracle shared with the service.
    pub oracle: ScriptedOracle,
}

impl Stack<DefaultClock> {
    /// Builds a stack on the system clock.
    #[must_use]
    pub fn new(settings: &AutomationSettings) -> Self {
        Self::with_clock(DefaultClock, settings)
    }
}

impl<C: Clock + Send + Sync + 'static> Stack<C> {
    /// Builds a stack on `clock`.
    #[must_use]
    pub fn with_clock(clock: C, settings: &AutomationSettings) -> Self {
        let oracle = ScriptedOracle::new();
        let gateway = Arc::new(InMemoryRepositoryGateway::new());
        let ports = AutomationPorts {
            configs: Arc::new(InMemoryAutomationConfigRepository::new()),
            gateway: Arc::clone(&gateway),
            oracle: Arc::new(oracle.clone()),
            proposals: Arc::new(InMemoryProposalRepository::new()),
            run_logs: Arc::new(InMemoryRunLogRepository::new()),
            clock: Arc::new(clock),
        };
        Self {
            service: AutomationService::new(ports, settings),
            gateway,
            oracle,
        }
    }

    /// Seeds the README and a library file.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the seed.
    pub fn seed(&self, config: &RepositoryAutomationConfig) -> eyre::Result<()> {
        let locator = config.locator();
        self.gateway.seed_file(&locator, "README.md", README)?;
        self.gateway
            .seed_file(&locator, "src/lib.rs", "pub fn widget() {}\n")?;
        Ok(())
    }

    /// Reads a file back from the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway state is unavailable.
    pub fn file(&self, config: &RepositoryAutomationConfig, path: &str) -> eyre::Result<String> {
        Ok(self
            .gateway
            .file(&config.locator(), path)?
            .unwrap_or_default())
    }
}

/// Oracle answer rewriting the README with installation steps.
#[must_use]
pub fn installation_answer() -> Value {
    json!({
        "plan": "Document installation",
        "changes": [{
            "filePath": "README.md",
            "action": "update",
            "reason": "Setup steps are missing",
            "modifiedContent": "# Widgets\n\nSmall widget toolkit.\n\n## Installation\n\n\
                                Add `widgets` to your manifest.\n\n## Usage\n\nCall `widget()`.\n"
        }],
        "commitMessage": "Document installation",
        "risk": "low",
        "explanation": "New users need setup steps"
    })
}

/// Oracle answer touching the README and adding a guide.
#[must_use]
pub fn two_file_answer() -> Value {
    json!({
        "plan": "Split documentation",
        "changes": [
            {
                "filePath": "README.md",
                "action": "update",
                "reason": "Point at the guide",
                "modifiedContent": "# Widgets\n\nSee docs/guide.md.\n"
            },
            {
                "filePath": "docs/guide.md",
                "action": "create",
                "reason": "Long-form guide",
                "modifiedContent": "# Guide\n\nEverything about widgets.\n"
            }
        ],
        "commitMessage": "Split documentation",
        "risk": "medium",
        "explanation": "The README grew too long"
    })
}

/// Oracle answer with a one-character README tweak.
#[must_use]
pub fn cosmetic_answer() -> Value {
    json!({
        "plan": "Punctuation",
        "changes": [{
            "filePath": "README.md",
            "action": "update",
            "reason": "Excitement",
            "modifiedContent": "# Widgets\n\nSmall widget toolkit!\n"
        }],
        "commitMessage": "Punctuation",
        "risk": "low",
        "explanation": "Cosmetic"
    })
}
