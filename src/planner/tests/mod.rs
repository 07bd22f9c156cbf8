//! Unit tests for change planning.

mod gate_tests;
