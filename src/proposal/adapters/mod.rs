//! Adapter implementations for proposal ports.

pub mod memory;
pub mod postgres;
