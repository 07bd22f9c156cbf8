//! `PostgreSQL` adapters for repository configuration persistence.

mod models;
mod repository;
mod schema;

pub use repository::{AutomationPgPool, PostgresAutomationConfigRepository};
