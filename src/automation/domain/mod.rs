//! Domain types for unattended automation.

mod bootstrap;
mod report;
mod settings;

pub use bootstrap::{
    BOOTSTRAP_ANALYSIS, BOOTSTRAP_COMMIT_MESSAGE, BOOTSTRAP_PATH, BootstrapError, render_readme,
};
pub use report::{RunReport, SkipReason};
pub use settings::{AutomationSettings, DEFAULT_UNATTENDED_INSTRUCTION};
