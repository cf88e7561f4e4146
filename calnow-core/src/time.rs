//! Timestamp/duration parsing and date rebasing.

use chrono::{DateTime, NaiveDateTime, Offset, TimeDelta, TimeZone, Timelike, Utc};

use crate::error::FieldError;

/// Literal layout of `DTSTART`/`DTEND` values. No offset, no `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Parse a `YYYYMMDDTHHMMSS` value.
///
/// Only the exact 15-character literal is accepted: no surrounding
/// whitespace and no leap second. The value carries no zone, so the result
/// is a wall-clock reading held in UTC until [`fix_date`] moves it into the
/// reference zone.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if !is_timestamp_literal(value) {
        return None;
    }

    let parsed = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()?;
    // chrono reads second 60 as a leap second
    (parsed.nanosecond() < 1_000_000_000).then(|| parsed.and_utc())
}

fn is_timestamp_literal(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 15
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 => *b == b'T',
            _ => b.is_ascii_digit(),
        })
}

/// Parse an ISO-8601 duration such as `PT1H30M` or `P1W`.
///
/// A leading `-` gives a negative duration, a leading `+` is accepted and ignored.
pub fn parse_duration(value: &str) -> Result<TimeDelta, FieldError> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let duration = iso8601::duration(body).map_err(|reason| FieldError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    })?;
    let std_duration: std::time::Duration = duration.into();
    let delta = TimeDelta::from_std(std_duration).map_err(|_| FieldError::OutOfRange {
        value: value.to_string(),
    })?;

    Ok(if negative { -delta } else { delta })
}

/// Rebuild `a`'s wall-clock reading (date, time, nanoseconds) in `b`'s zone.
pub fn fix_date<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> DateTime<B> {
    rebase(a.naive_local(), b)
}

/// Place a wall-clock reading in the zone of `reference`.
///
/// Ambiguous readings take the earliest instant. Readings that fall in a
/// gap use the reference's current offset.
pub(crate) fn rebase<B: TimeZone>(wall: NaiveDateTime, reference: &DateTime<B>) -> DateTime<B> {
    let tz = reference.timezone();
    tz.from_local_datetime(&wall).earliest().unwrap_or_else(|| {
        let offset = i64::from(reference.offset().fix().local_minus_utc());
        tz.from_utc_datetime(&(wall - TimeDelta::seconds(offset)))
    })
}
