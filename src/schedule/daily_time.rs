//! Wall-clock daily times and the recurrence rules derived from them.

use super::ScheduleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DailyTime {
    hour: u8,
    minute: u8,
}

impl DailyTime {
    /// Midnight, the schedule assigned to newly connected repositories.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Creates a daily time from numeric components.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::OutOfRange`] when `hour > 23` or
    /// `minute > 59`.
    pub const fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::OutOfRange { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    /// Returns the hour component (`0..=23`).
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Returns the minute component (`0..=59`).
    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Returns the daily recurrence rule firing at this time.
    #[must_use]
    pub const fn recurrence_rule(self) -> RecurrenceRule {
        RecurrenceRule::daily(self)
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for DailyTime {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_time(value)
    }
}

impl TryFrom<String> for DailyTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_time(&value)
    }
}

impl From<DailyTime> for String {
    fn from(value: DailyTime) -> Self {
        value.to_string()
    }
}

/// Parses a strict `HH:MM` 24-hour time.
///
/// Both components must be exactly two ASCII digits.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidFormat`] for any other shape or for
/// components outside `00..=23` / `00..=59`.
///
/// # Examples
///
/// ```
/// use repo_autopilot::schedule::parse_time;
///
/// let time = parse_time("09:30").expect("valid time");
/// assert_eq!((time.hour(), time.minute()), (9, 30));
/// assert!(parse_time("24:00").is_err());
/// ```
pub fn parse_time(value: &str) -> Result<DailyTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidFormat(value.to_owned());
    let (hour_text, minute_text) = value.split_once(':').ok_or_else(invalid)?;
    let hour = parse_two_digits(hour_text).ok_or_else(invalid)?;
    let minute = parse_two_digits(minute_text).ok_or_else(invalid)?;
    DailyTime::new(hour, minute).map_err(|_| invalid())
}

fn parse_two_digits(text: &str) -> Option<u8> {
    let &[tens, units] = text.as_bytes() else {
        return None;
    };
    if !tens.is_ascii_digit() || !units.is_ascii_digit() {
        return None;
    }
    Some((tens - b'0') * 10 + (units - b'0'))
}

/// Encoding of "once daily at `HH:MM` local time".
///
/// The rule carries no timezone; it is always paired with the
/// repository's zone when fire instants are computed. It renders in
/// five-field cron syntax (`minute hour * * *`), which is also its
/// persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    time: DailyTime,
}

impl RecurrenceRule {
    /// Creates a daily rule firing at `time`.
    #[must_use]
    pub const fn daily(time: DailyTime) -> Self {
        Self { time }
    }

    /// Returns the local time of day the rule fires at.
    #[must_use]
    pub const fn time(self) -> DailyTime {
        self.time
    }

    /// Returns the rule as a cron expression.
    #[must_use]
    pub fn to_cron_expression(self) -> String {
        format!("{} {} * * *", self.time.minute(), self.time.hour())
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cron_expression())
    }
}

/// Builds the daily recurrence rule for `hour:minute`.
///
/// # Errors
///
/// Returns [`ScheduleError::OutOfRange`] when the components are invalid.
pub fn to_recurrence_rule(hour: u8, minute: u8) -> Result<RecurrenceRule, ScheduleError> {
    DailyTime::new(hour, minute).map(RecurrenceRule::daily)
}
