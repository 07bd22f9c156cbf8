//! Shared world state for proposal review BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use repo_autopilot::automation::{
    domain::{AutomationSettings, RunReport},
    services::{AutomationError, AutomationPorts, AutomationService},
};
use repo_autopilot::planner::adapters::ScriptedOracle;
use repo_autopilot::proposal::{
    adapters::memory::{InMemoryProposalRepository, InMemoryRunLogRepository},
    domain::ChangeProposal,
};
use repo_autopilot::repository::{
    adapters::memory::{InMemoryAutomationConfigRepository, InMemoryRepositoryGateway},
    domain::RepositoryAutomationConfig,
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestAutomationService = AutomationService<
    InMemoryAutomationConfigRepository,
    InMemoryRepositoryGateway,
    ScriptedOracle,
    InMemoryProposalRepository,
    InMemoryRunLogRepository,
    DefaultClock,
>;

/// README seeded by the "with a README" step.
pub const SEEDED_README: &str = "# Widgets\n\nSmall widget toolkit.\n";

/// Scenario world for proposal review behaviour tests.
pub struct ReviewWorld {
    /// The automation facade under test.
    pub service: TestAutomationService,
    /// Repository content shared with the service.
    pub gateway: Arc<InMemoryRepositoryGateway>,
    /// Scripted oracle shared with the service.
    pub oracle: ScriptedOracle,
    /// Repository connected by the scenario.
    pub config: Option<RepositoryAutomationConfig>,
    /// Last proposal submitted.
    pub proposal: Option<ChangeProposal>,
    /// Report of the last unattended run.
    pub last_report: Option<RunReport>,
    /// Error of the last approval attempt.
    pub last_approval_error: Option<AutomationError>,
}

impl ReviewWorld {
    /// Creates a world with no connected repository.
    #[must_use]
    pub fn new() -> Self {
        let oracle = ScriptedOracle::new();
        let gateway = Arc::new(InMemoryRepositoryGateway::new());
        let ports = AutomationPorts {
            configs: Arc::new(InMemoryAutomationConfigRepository::new()),
            gateway: Arc::clone(&gateway),
            oracle: Arc::new(oracle.clone()),
            proposals: Arc::new(InMemoryProposalRepository::new()),
            run_logs: Arc::new(InMemoryRunLogRepository::new()),
            clock: Arc::new(DefaultClock),
        };
        Self {
            service: AutomationService::new(ports, &AutomationSettings::default()),
            gateway,
            oracle,
            config: None,
            proposal: None,
            last_report: None,
            last_approval_error: None,
        }
    }

    /// Returns the connected repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository has been connected yet.
    pub fn config(&self) -> Result<&RepositoryAutomationConfig, eyre::Report> {
        self.config
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no repository connected in scenario world"))
    }

    /// Returns the last submitted proposal.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been submitted yet.
    pub fn proposal(&self) -> Result<&ChangeProposal, eyre::Report> {
        self.proposal
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no proposal submitted in scenario world"))
    }

    /// Reads the README of the connected repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is connected or the gateway fails.
    pub fn readme(&self) -> Result<String, eyre::Report> {
        let locator = self.config()?.locator();
        Ok(self
            .gateway
            .file(&locator, "README.md")?
            .unwrap_or_default())
    }
}

impl Default for ReviewWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReviewWorld {
    ReviewWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
