//! [`CalendarSource`] over a CalDAV server.
//!
//! Discovery flow:
//! 1. current-user-principal on the configured URL
//! 2. calendar-home-set of that principal
//! 3. PROPFIND on each home set for its calendar collections
//! 4. calendar-query REPORT per calendar, limited to the day window

use anyhow::{Context, Result};
use calnow_core::{
    CalNowError, CalNowResult, CalendarCollection, CalendarSource, DayWindow, RawEvent,
};
use http::Uri;
use libdav::caldav::FindCalendarHomeSet;
use tracing::debug;

use crate::caldav::{
    CalNowCalDavClient, FindCalendarCollections, QueryEventsInRange, create_caldav_client,
};
use crate::ics::parse_raw_events;

/// A CalDAV server reached with basic auth.
pub struct CalDavSource {
    caldav: CalNowCalDavClient,
}

impl CalDavSource {
    /// Build the client. No request is sent until discovery starts.
    pub fn connect(url: &str, username: &str, password: &str) -> CalNowResult<Self> {
        let caldav = create_caldav_client(url, username, password)
            .map_err(|err| CalNowError::Connect(format!("{:#}", err)))?;
        Ok(CalDavSource { caldav })
    }

    async fn find_principal(&self) -> Result<String> {
        let principal = self
            .caldav
            .find_current_user_principal()
            .await
            .context("PROPFIND current-user-principal failed")?
            .ok_or_else(|| anyhow::anyhow!("Server did not report a principal. Check the user name and password."))?;

        Ok(principal.to_string())
    }

    async fn find_home_sets(&self, principal: &str) -> Result<Vec<String>> {
        let principal: Uri = principal
            .parse()
            .with_context(|| format!("Invalid principal href: {}", principal))?;

        let response = self
            .caldav
            .request(FindCalendarHomeSet::new(&principal))
            .await
            .context("PROPFIND calendar-home-set failed")?;

        Ok(response
            .home_sets
            .into_iter()
            .map(|home_set| home_set.path().to_string())
            .collect())
    }

    async fn find_calendars(&self, home_set: &str) -> Result<Vec<CalendarCollection>> {
        let response = self
            .caldav
            .request(FindCalendarCollections::new(home_set))
            .await
            .context("PROPFIND on calendar home set failed")?;

        Ok(response.calendars)
    }

    async fn fetch_events(&self, calendar: &CalendarCollection, window: &DayWindow) -> Result<Vec<RawEvent>> {
        let response = self
            .caldav
            .request(QueryEventsInRange::new(&calendar.path, &window.start, &window.end))
            .await
            .context("calendar-query REPORT failed")?;

        let mut events = Vec::new();
        for resource in response.resources {
            match parse_raw_events(&resource.data) {
                Some(parsed) => events.extend(parsed),
                None => debug!(href = %resource.href, "Skipping unparseable calendar data"),
            }
        }

        Ok(events)
    }
}

impl CalendarSource for CalDavSource {
    async fn current_user_principal(&self) -> CalNowResult<String> {
        self.find_principal()
            .await
            .map_err(|err| CalNowError::Principal(format!("{:#}", err)))
    }

    async fn calendar_home_sets(&self, principal: &str) -> CalNowResult<Vec<String>> {
        self.find_home_sets(principal)
            .await
            .map_err(|err| CalNowError::HomeSet(format!("{:#}", err)))
    }

    async fn calendars(&self, home_set: &str) -> CalNowResult<Vec<CalendarCollection>> {
        self.find_calendars(home_set)
            .await
            .map_err(|err| CalNowError::Calendars {
                home_set: home_set.to_string(),
                reason: format!("{:#}", err),
            })
    }

    async fn query_events(
        &self,
        calendar: &CalendarCollection,
        window: &DayWindow,
    ) -> CalNowResult<Vec<RawEvent>> {
        self.fetch_events(calendar, window)
            .await
            .map_err(|err| CalNowError::Query {
                calendar: calendar.display_name().to_string(),
                reason: format!("{:#}", err),
            })
    }
}
