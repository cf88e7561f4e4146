//! Error types for calnow.

use thiserror::Error;

use crate::event::FieldName;

/// Errors that can occur while looking for a current event.
///
/// `Config`, `Connect`, `Principal`, `HomeSet` and `Timeout` end the run.
/// `Calendars` and `Query` only ever cost the scan one home set or one
/// calendar.
#[derive(Error, Debug)]
pub enum CalNowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create CalDAV client: {0}")]
    Connect(String),

    #[error("Failed to find current user principal: {0}")]
    Principal(String),

    #[error("Failed to find calendar home set: {0}")]
    HomeSet(String),

    #[error("Failed to find calendars for home set {home_set}: {reason}")]
    Calendars { home_set: String, reason: String },

    #[error("Failed to query calendar {calendar}: {reason}")]
    Query { calendar: String, reason: String },

    #[error("Calendar server did not answer within {0}s")]
    Timeout(u64),
}

impl CalNowError {
    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CalNowError::Calendars { .. } | CalNowError::Query { .. })
    }
}

/// Result type alias for calnow operations.
pub type CalNowResult<T> = Result<T, CalNowError>;

/// Why a single event field could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{0} is not set")]
    Missing(FieldName),

    #[error("{field} value '{value}' is not a YYYYMMDDTHHMMSS timestamp")]
    InvalidTimestamp { field: FieldName, value: String },

    #[error("DURATION value '{value}' is not an ISO-8601 duration: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("DURATION value '{value}' puts the end out of range")]
    OutOfRange { value: String },
}

impl FieldError {
    /// True when the field was absent rather than malformed.
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldError::Missing(_))
    }
}
