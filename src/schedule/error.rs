//! Error types for schedule parsing and validation.

use thiserror::Error;

/// Errors returned while building schedule values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The time string does not match `HH:MM` in 24-hour format.
    #[error("invalid time '{0}', expected HH:MM in 24-hour format")]
    InvalidFormat(String),

    /// Numeric hour or minute components are outside their valid range.
    #[error("time component out of range: hour {hour}, minute {minute}")]
    OutOfRange {
        /// Requested hour.
        hour: u8,
        /// Requested minute.
        minute: u8,
    },

    /// The timezone name is not present in the IANA database.
    #[error("unknown IANA timezone: {0}")]
    InvalidTimeZone(String),
}
