//! Unit tests for the automation runtime.

mod pipeline_tests;
mod service_tests;
