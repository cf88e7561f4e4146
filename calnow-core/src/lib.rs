//! Core of calnow: decide whether a calendar event covers the current instant.
//!
//! - [`event`]: raw event fields as returned by a calendar source
//! - [`interval`]: interval resolution, date rebasing and the containment test
//! - [`source`]: the trait a calendar backend implements
//! - [`scan`]: discovery and query orchestration over a [`CalendarSource`]

pub mod day_window;
pub mod error;
pub mod event;
pub mod interval;
pub mod scan;
pub mod source;
pub mod time;

pub use day_window::DayWindow;
pub use error::{CalNowError, CalNowResult, FieldError};
pub use event::{FieldName, RawEvent};
pub use interval::{Hit, Interval, Resolution, contains, evaluate};
pub use scan::{Match, Verdict, find_covering, scan};
pub use source::{CalendarCollection, CalendarSource};
pub use time::fix_date;
