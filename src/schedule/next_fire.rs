//! Timezone validation and next-fire computation.

use super::{DailyTime, ScheduleError};
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of local days inspected when searching for the next fire.
///
/// Today and tomorrow always suffice; the third day only matters for
/// zones that skip an entire calendar day.
const LOOKAHEAD_DAYS: usize = 3;

/// Validated IANA timezone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleTimeZone {
    name: String,
    zone: Tz,
}

impl ScheduleTimeZone {
    /// Resolves a timezone from its IANA name.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTimeZone`] when the name is unknown.
    pub fn new(name: impl Into<String>) -> Result<Self, ScheduleError> {
        let raw = name.into();
        let normalized = raw.trim();
        let zone = normalized
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimeZone(raw.clone()))?;
        Ok(Self {
            name: normalized.to_owned(),
            zone,
        })
    }

    /// Returns the UTC zone, the default for newly connected repositories.
    #[must_use]
    pub fn utc() -> Self {
        Self {
            name: "UTC".to_owned(),
            zone: Tz::UTC,
        }
    }

    /// Returns the IANA name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolved zone.
    #[must_use]
    pub const fn zone(&self) -> Tz {
        self.zone
    }
}

impl Default for ScheduleTimeZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for ScheduleTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl TryFrom<String> for ScheduleTimeZone {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScheduleTimeZone> for String {
    fn from(value: ScheduleTimeZone) -> Self {
        value.name
    }
}

/// Returns whether `name` is a known IANA timezone.
#[must_use]
pub fn is_valid_time_zone(name: &str) -> bool {
    name.trim().parse::<Tz>().is_ok()
}

/// Computes the next instant strictly after `now` at which a daily rule
/// for `time` fires in `zone`.
///
/// If today's local `time` is still ahead of `now`, that instant is
/// returned; otherwise the same local time tomorrow. A local time that
/// falls into a daylight-saving gap fires one hour later on the
/// wall clock; an ambiguous local time fires at the earlier instant.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use repo_autopilot::schedule::{DailyTime, ScheduleTimeZone, next_fire_instant};
///
/// let time = DailyTime::new(9, 30).expect("valid time");
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
/// let next = next_fire_instant(time, &ScheduleTimeZone::utc(), now);
/// assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap());
/// ```
#[must_use]
pub fn next_fire_instant(
    time: DailyTime,
    zone: &ScheduleTimeZone,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let tz = zone.zone();
    now.with_timezone(&tz)
        .date_naive()
        .iter_days()
        .take(LOOKAHEAD_DAYS)
        .filter_map(|day| resolve_local(tz, day, time))
        .find(|candidate| *candidate > now)
        .unwrap_or_else(|| now + TimeDelta::days(1))
}

fn resolve_local(tz: Tz, day: NaiveDate, time: DailyTime) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|zoned| zoned.with_timezone(&Utc))
}
