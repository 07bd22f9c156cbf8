//! Adapter implementations of the oracle port.

mod scripted;

pub use scripted::{OracleCall, ScriptedOracle};
