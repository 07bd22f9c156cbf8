//! Step definitions for change proposal review scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
