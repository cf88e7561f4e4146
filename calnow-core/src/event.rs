//! Raw event records as handed over by a calendar source.
//!
//! A source returns one [`RawEvent`] per VEVENT. Values are kept as the raw
//! text the server sent; interpretation happens in [`crate::interval`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::FieldError;
use crate::time::{parse_duration, parse_timestamp};

/// The event properties calnow looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Summary,
    Uid,
    DtStart,
    DtEnd,
    Duration,
}

impl FieldName {
    /// Every recognized field, in the order sources should request them.
    pub const ALL: [FieldName; 5] = [
        FieldName::Summary,
        FieldName::Uid,
        FieldName::DtStart,
        FieldName::DtEnd,
        FieldName::Duration,
    ];

    /// The iCalendar property name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Summary => "SUMMARY",
            FieldName::Uid => "UID",
            FieldName::DtStart => "DTSTART",
            FieldName::DtEnd => "DTEND",
            FieldName::Duration => "DURATION",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Field values of one event, each optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    values: [Option<String>; 5],
}

impl RawEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    ///
    /// Unknown names are ignored. When a name repeats, the first value wins.
    pub fn from_properties<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut event = RawEvent::new();
        for (name, value) in properties {
            let Ok(field) = name.parse::<FieldName>() else {
                continue;
            };
            if event.get(field).is_none() {
                event.values[field.index()] = Some(value.to_string());
            }
        }
        event
    }

    /// Set a field, replacing any previous value.
    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.values[field.index()] = Some(value.into());
        self
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.values[field.index()].as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.get(FieldName::Summary)
    }

    pub fn uid(&self) -> Option<&str> {
        self.get(FieldName::Uid)
    }

    /// Whether at least one way of resolving an interval has its fields.
    ///
    /// Needs `DTSTART` plus either `DTEND` or `DURATION`.
    pub fn is_evaluable(&self) -> bool {
        self.get(FieldName::DtStart).is_some()
            && (self.get(FieldName::DtEnd).is_some() || self.get(FieldName::Duration).is_some())
    }

    /// Parse a timestamp field (`DTSTART` or `DTEND`).
    pub fn timestamp(&self, field: FieldName) -> Result<DateTime<Utc>, FieldError> {
        let value = self.get(field).ok_or(FieldError::Missing(field))?;
        parse_timestamp(value).ok_or_else(|| FieldError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
    }

    /// Parse the `DURATION` field.
    pub fn duration(&self) -> Result<TimeDelta, FieldError> {
        let value = self
            .get(FieldName::Duration)
            .ok_or(FieldError::Missing(FieldName::Duration))?;
        parse_duration(value)
    }
}
