//! Initial README for repositories without commits.

use crate::repository::domain::RepositoryFullName;
use minijinja::{Environment, context};
use thiserror::Error;

/// Path of the bootstrap file.
pub const BOOTSTRAP_PATH: &str = "README.md";

/// Commit message of the bootstrap commit.
pub const BOOTSTRAP_COMMIT_MESSAGE: &str = "Initialize repository with README";

/// Run log analysis recorded for a bootstrap.
pub const BOOTSTRAP_ANALYSIS: &str = "Created initial README for empty repository";

const README_TEMPLATE: &str = "# {{ name }}

{{ description }}

## About

This repository was initialized by automated maintenance.

## Getting Started

Start adding your code and documentation here!

---
*This README was auto-generated*
";

const FALLBACK_DESCRIPTION: &str = "A new repository";

/// The bootstrap template failed to render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render bootstrap README: {reason}")]
pub struct BootstrapError {
    /// Renderer message.
    pub reason: String,
}

/// Renders the bootstrap README for a repository.
///
/// # Errors
///
/// Returns [`BootstrapError`] when the template engine fails.
pub fn render_readme(
    full_name: &RepositoryFullName,
    description: Option<&str>,
) -> Result<String, BootstrapError> {
    let description_text = description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(FALLBACK_DESCRIPTION);
    Environment::new()
        .render_str(
            README_TEMPLATE,
            context! {
                name => full_name.name(),
                description => description_text,
            },
        )
        .map_err(|error| BootstrapError {
            reason: error.to_string(),
        })
}
