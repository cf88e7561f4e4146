//! Walk every calendar of the user and stop at the first event covering now.

use std::fmt;

use chrono::{DateTime, TimeZone};
use tracing::{debug, warn};

use crate::day_window::DayWindow;
use crate::error::{CalNowError, CalNowResult};
use crate::event::RawEvent;
use crate::interval::{Interval, Resolution, evaluate};
use crate::source::{CalendarCollection, CalendarSource};

/// The event that covers the reference instant.
#[derive(Debug, Clone)]
pub struct Match<Tz: TimeZone> {
    pub calendar: String,
    pub summary: Option<String>,
    pub uid: Option<String>,
    pub resolution: Resolution,
    pub interval: Interval<Tz>,
}

/// Outcome of a scan.
#[derive(Debug, Clone)]
pub enum Verdict<Tz: TimeZone> {
    /// An event covers now
    Busy(Match<Tz>),
    /// Nothing covers now
    Free,
}

impl<Tz: TimeZone> Verdict<Tz> {
    pub fn is_busy(&self) -> bool {
        matches!(self, Verdict::Busy(_))
    }
}

/// Look through all calendars of the current user for an event covering `now`.
///
/// Principal and home-set discovery failures are returned as errors. A home
/// set whose calendars cannot be listed, or a calendar that cannot be
/// queried, is logged and skipped.
pub async fn scan<S, Tz>(source: &S, now: &DateTime<Tz>) -> CalNowResult<Verdict<Tz>>
where
    S: CalendarSource,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let principal = source.current_user_principal().await?;
    debug!(%principal, "Found current user principal");

    let home_sets = source.calendar_home_sets(&principal).await?;
    if home_sets.is_empty() {
        return Err(CalNowError::HomeSet(format!(
            "no calendar home set for principal {}",
            principal
        )));
    }

    let window = DayWindow::containing(now);
    debug!(%window, "Querying events");

    for home_set in &home_sets {
        let calendars = match source.calendars(home_set).await {
            Ok(calendars) => calendars,
            Err(err) => {
                warn!("{}", err);
                continue;
            }
        };

        for calendar in calendars.iter().filter(|c| c.supports_events()) {
            let events = match source.query_events(calendar, &window).await {
                Ok(events) => events,
                Err(err) => {
                    warn!("{}", err);
                    continue;
                }
            };

            if let Some(found) = find_covering(calendar, &events, now) {
                return Ok(Verdict::Busy(found));
            }
        }
    }

    Ok(Verdict::Free)
}

/// The first event of `calendar` covering `now`, if any.
pub fn find_covering<Tz>(
    calendar: &CalendarCollection,
    events: &[RawEvent],
    now: &DateTime<Tz>,
) -> Option<Match<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    events.iter().find_map(|event| {
        if let Some(summary) = event.summary() {
            debug!("{}:{}", calendar.display_name(), summary);
        }

        evaluate(event, now).map(|hit| Match {
            calendar: calendar.display_name().to_string(),
            summary: event.summary().map(str::to_string),
            uid: event.uid().map(str::to_string),
            resolution: hit.resolution,
            interval: hit.interval,
        })
    })
}
