//! Adapter implementations for repository ports.

pub mod memory;
pub mod postgres;
