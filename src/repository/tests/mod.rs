//! Unit tests for connected repositories.
