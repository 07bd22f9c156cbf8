//! Daily schedule resolution for repository automation.
//!
//! Converts a wall-clock `HH:MM` time and an IANA timezone into a daily
//! recurrence rule and the next instant at which that rule fires. All
//! arithmetic happens on zoned date-times, so a daylight-saving transition
//! moves the UTC instant rather than the local wall-clock time.

mod daily_time;
mod error;
mod next_fire;

pub use daily_time::{DailyTime, RecurrenceRule, parse_time, to_recurrence_rule};
pub use error::ScheduleError;
pub use next_fire::{ScheduleTimeZone, is_valid_time_zone, next_fire_instant};
