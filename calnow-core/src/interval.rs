//! Resolving event intervals and testing whether they contain an instant.
//!
//! An event's interval comes from `DTSTART` plus either `DTEND` or
//! `DURATION`. Both readings are rebased onto the zone of "now" before the
//! containment test, which is a strict open interval.

use std::fmt;

use chrono::{DateTime, TimeZone};
use tracing::{debug, trace};

use crate::error::FieldError;
use crate::event::{FieldName, RawEvent};
use crate::time::fix_date;

/// `begin < now < end`. Equality at either bound does not count.
pub fn contains<Tz: TimeZone>(now: &DateTime<Tz>, begin: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
    now > begin && now < end
}

/// Which fields an interval was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// `DTSTART` and `DTEND`
    ExplicitEnd,
    /// `DTSTART` plus `DURATION`
    Duration,
}

impl Resolution {
    /// Resolution paths in the order they are tried.
    pub const ORDER: [Resolution; 2] = [Resolution::ExplicitEnd, Resolution::Duration];
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::ExplicitEnd => f.write_str("DTEND"),
            Resolution::Duration => f.write_str("DURATION"),
        }
    }
}

/// An event interval in the zone of the reference instant.
///
/// `end` may precede `begin`; such an interval contains nothing.
#[derive(Debug, Clone)]
pub struct Interval<Tz: TimeZone> {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Interval<Tz> {
    pub fn new(begin: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { begin, end }
    }

    pub fn contains(&self, now: &DateTime<Tz>) -> bool {
        contains(now, &self.begin, &self.end)
    }

    /// Resolve an event's interval along one path, rebased onto `now`'s zone.
    pub fn resolve(
        event: &RawEvent,
        resolution: Resolution,
        now: &DateTime<Tz>,
    ) -> Result<Self, FieldError> {
        let (begin, end) = match resolution {
            Resolution::ExplicitEnd => {
                let end = event.timestamp(FieldName::DtEnd)?;
                let begin = event.timestamp(FieldName::DtStart)?;
                (begin, end)
            }
            Resolution::Duration => {
                let begin = event.timestamp(FieldName::DtStart)?;
                let duration = event.duration()?;
                let end = begin
                    .checked_add_signed(duration)
                    .ok_or_else(|| FieldError::OutOfRange {
                        value: event.get(FieldName::Duration).unwrap_or_default().to_string(),
                    })?;
                (begin, end)
            }
        };

        Ok(Interval::new(fix_date(&begin, now), fix_date(&end, now)))
    }
}

/// The first interval of an event that contains the reference instant.
#[derive(Debug, Clone)]
pub struct Hit<Tz: TimeZone> {
    pub resolution: Resolution,
    pub interval: Interval<Tz>,
}

/// Check whether `event` covers `now`.
///
/// Tries the `DTEND` path, then the `DURATION` path, and stops at the first
/// interval containing `now`. A path whose fields are missing or malformed
/// is skipped quietly.
pub fn evaluate<Tz>(event: &RawEvent, now: &DateTime<Tz>) -> Option<Hit<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if !event.is_evaluable() {
        trace!(uid = event.uid(), "Skipping event without DTSTART and DTEND/DURATION");
        return None;
    }

    for resolution in Resolution::ORDER {
        let interval = match Interval::resolve(event, resolution, now) {
            Ok(interval) => interval,
            Err(err) if err.is_missing() => {
                trace!(uid = event.uid(), path = %resolution, "{}", err);
                continue;
            }
            Err(err) => {
                debug!(uid = event.uid(), path = %resolution, "Ignoring field: {}", err);
                continue;
            }
        };

        let between = interval.contains(now);
        debug!(
            "{} <{}> {}, between: {}",
            interval.begin, now, interval.end, between
        );
        if between {
            return Some(Hit { resolution, interval });
        }
    }

    None
}
