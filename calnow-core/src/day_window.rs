//! The day-long range used to pre-filter event queries.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::time::rebase;

/// Today in the zone of the reference instant, from 00:00:01 to
/// 23:59:59.999999999, held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The window for the calendar day `now` falls on, in `now`'s zone.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        let start = midnight + TimeDelta::seconds(1);
        let end = midnight + TimeDelta::days(1) - TimeDelta::nanoseconds(1);

        DayWindow {
            start: rebase(start, now).with_timezone(&Utc),
            end: rebase(end, now).with_timezone(&Utc),
        }
    }
}

impl fmt::Display for DayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
