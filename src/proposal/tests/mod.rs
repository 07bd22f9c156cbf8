//! Unit tests for change proposals, their stores and application.
