//! The interface a calendar backend implements for calnow.

use crate::day_window::DayWindow;
use crate::error::CalNowResult;
use crate::event::RawEvent;

/// A calendar collection found under a calendar home set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCollection {
    /// Path (href) of the collection on the server
    pub path: String,
    /// Display name, if the server reports one
    pub name: Option<String>,
    /// Component types the collection accepts (`VEVENT`, `VTODO`, ...).
    /// `None` when the server did not restrict them.
    pub supported_components: Option<Vec<String>>,
}

impl CalendarCollection {
    pub fn new(path: impl Into<String>) -> Self {
        CalendarCollection {
            path: path.into(),
            name: None,
            supported_components: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    /// Name for log lines: the display name, else the path.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }

    /// Whether the collection can hold VEVENTs.
    pub fn supports_events(&self) -> bool {
        match &self.supported_components {
            None => true,
            Some(components) => components.iter().any(|c| c.eq_ignore_ascii_case("VEVENT")),
        }
    }
}

/// Discovery and query operations of a remote calendar store.
///
/// Implementations report failures as [`crate::CalNowError`] variants that
/// name the failing step; the scan decides which of them are fatal.
#[allow(async_fn_in_trait)]
pub trait CalendarSource {
    /// Href of the authenticated user's principal.
    async fn current_user_principal(&self) -> CalNowResult<String>;

    /// Calendar home set hrefs of `principal`.
    async fn calendar_home_sets(&self, principal: &str) -> CalNowResult<Vec<String>>;

    /// Calendar collections under `home_set`.
    async fn calendars(&self, home_set: &str) -> CalNowResult<Vec<CalendarCollection>>;

    /// VEVENTs of `calendar` overlapping `window`.
    async fn query_events(
        &self,
        calendar: &CalendarCollection,
        window: &DayWindow,
    ) -> CalNowResult<Vec<RawEvent>>;
}
