//! Port contracts for the reasoning oracle.

pub mod oracle;

pub use oracle::{OracleError, OracleResult, ReasoningOracle};
