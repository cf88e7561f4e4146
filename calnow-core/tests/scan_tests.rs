use std::cell::RefCell;
use std::collections::HashMap;

use calnow_core::{
    CalNowError, CalNowResult, CalendarCollection, CalendarSource, DayWindow, FieldName, RawEvent,
    Resolution, Verdict, scan,
};
use chrono::{DateTime, FixedOffset, TimeZone};

/// In-memory calendar store.
#[derive(Default)]
struct FakeSource {
    principal_fails: bool,
    home_sets: Vec<String>,
    failing_home_sets: Vec<String>,
    calendars: HashMap<String, Vec<CalendarCollection>>,
    events: HashMap<String, Vec<RawEvent>>,
    failing_calendars: Vec<String>,
    queried: RefCell<Vec<String>>,
    windows: RefCell<Vec<DayWindow>>,
}

impl FakeSource {
    fn new() -> Self {
        FakeSource {
            home_sets: vec!["/home/".to_string()],
            ..Default::default()
        }
    }

    fn calendar(mut self, home_set: &str, calendar: CalendarCollection, events: Vec<RawEvent>) -> Self {
        self.events.insert(calendar.path.clone(), events);
        self.calendars
            .entry(home_set.to_string())
            .or_default()
            .push(calendar);
        self
    }

    fn failing_calendar(mut self, home_set: &str, calendar: CalendarCollection) -> Self {
        self.failing_calendars.push(calendar.path.clone());
        self.calendars
            .entry(home_set.to_string())
            .or_default()
            .push(calendar);
        self
    }

    fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }
}

impl CalendarSource for FakeSource {
    async fn current_user_principal(&self) -> CalNowResult<String> {
        if self.principal_fails {
            return Err(CalNowError::Principal("401 Unauthorized".to_string()));
        }
        Ok("/principals/alice/".to_string())
    }

    async fn calendar_home_sets(&self, _principal: &str) -> CalNowResult<Vec<String>> {
        Ok(self.home_sets.clone())
    }

    async fn calendars(&self, home_set: &str) -> CalNowResult<Vec<CalendarCollection>> {
        if self.failing_home_sets.iter().any(|h| h == home_set) {
            return Err(CalNowError::Calendars {
                home_set: home_set.to_string(),
                reason: "500 Internal Server Error".to_string(),
            });
        }
        Ok(self.calendars.get(home_set).cloned().unwrap_or_default())
    }

    async fn query_events(
        &self,
        calendar: &CalendarCollection,
        window: &DayWindow,
    ) -> CalNowResult<Vec<RawEvent>> {
        self.queried.borrow_mut().push(calendar.path.clone());
        self.windows.borrow_mut().push(*window);
        if self.failing_calendars.contains(&calendar.path) {
            return Err(CalNowError::Query {
                calendar: calendar.path.clone(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(self.events.get(&calendar.path).cloned().unwrap_or_default())
    }
}

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 1, 14, 30, 0)
        .unwrap()
}

fn event(summary: &str, start: &str) -> RawEvent {
    RawEvent::new()
        .with(FieldName::Summary, summary)
        .with(FieldName::Uid, format!("{}@example.com", summary))
        .with(FieldName::DtStart, start)
}

#[tokio::test]
async fn test_event_covering_now_is_busy() {
    let source = FakeSource::new().calendar(
        "/home/",
        CalendarCollection::new("/home/work/").with_name("Work"),
        vec![event("Planning", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
    );

    let verdict = scan(&source, &now()).await.unwrap();

    let Verdict::Busy(found) = verdict else {
        panic!("expected busy");
    };
    assert_eq!(found.calendar, "Work");
    assert_eq!(found.summary.as_deref(), Some("Planning"));
    assert_eq!(found.uid.as_deref(), Some("Planning@example.com"));
    assert_eq!(found.resolution, Resolution::ExplicitEnd);
}

#[tokio::test]
async fn test_duration_ending_exactly_now_keeps_scanning() {
    let source = FakeSource::new()
        .calendar(
            "/home/",
            CalendarCollection::new("/home/a/"),
            vec![event("Short", "20240601T140000").with(FieldName::Duration, "PT30M")],
        )
        .calendar(
            "/home/",
            CalendarCollection::new("/home/b/"),
            vec![event("Long", "20240601T140000").with(FieldName::Duration, "PT2H")],
        );

    let verdict = scan(&source, &now()).await.unwrap();

    let Verdict::Busy(found) = verdict else {
        panic!("expected busy");
    };
    assert_eq!(found.summary.as_deref(), Some("Long"));
    assert_eq!(found.resolution, Resolution::Duration);
    assert_eq!(source.queried(), vec!["/home/a/", "/home/b/"]);
}

#[tokio::test]
async fn test_unevaluable_event_alone_is_free() {
    let source = FakeSource::new().calendar(
        "/home/",
        CalendarCollection::new("/home/work/"),
        vec![event("Open ended", "20240601T140000")],
    );

    let verdict = scan(&source, &now()).await.unwrap();

    assert!(!verdict.is_busy());
}

#[tokio::test]
async fn test_failed_calendar_is_skipped() {
    let source = FakeSource::new()
        .failing_calendar("/home/", CalendarCollection::new("/home/broken/"))
        .calendar(
            "/home/",
            CalendarCollection::new("/home/work/"),
            vec![event("Review", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
        );

    let verdict = scan(&source, &now()).await.unwrap();

    assert!(verdict.is_busy());
    assert_eq!(source.queried(), vec!["/home/broken/", "/home/work/"]);
}

#[tokio::test]
async fn test_malformed_event_does_not_stop_later_events() {
    let source = FakeSource::new().calendar(
        "/home/",
        CalendarCollection::new("/home/work/"),
        vec![
            event("Broken", "20240601T140000").with(FieldName::DtEnd, "soon"),
            event("Fine", "20240601T140000").with(FieldName::DtEnd, "20240601T150000"),
        ],
    );

    let Verdict::Busy(found) = scan(&source, &now()).await.unwrap() else {
        panic!("expected busy");
    };
    assert_eq!(found.summary.as_deref(), Some("Fine"));
}

#[tokio::test]
async fn test_first_match_stops_the_scan() {
    let source = FakeSource::new()
        .calendar(
            "/home/",
            CalendarCollection::new("/home/a/"),
            vec![event("Now", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
        )
        .calendar(
            "/home/",
            CalendarCollection::new("/home/b/"),
            vec![event("Also now", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
        );

    let verdict = scan(&source, &now()).await.unwrap();

    assert!(verdict.is_busy());
    assert_eq!(source.queried(), vec!["/home/a/"]);
}

#[tokio::test]
async fn test_calendars_without_events_are_not_queried() {
    let source = FakeSource::new()
        .calendar(
            "/home/",
            CalendarCollection::new("/home/tasks/").with_components(["VTODO"]),
            vec![event("Task", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
        )
        .calendar(
            "/home/",
            CalendarCollection::new("/home/work/").with_components(["VEVENT", "VTODO"]),
            vec![],
        );

    let verdict = scan(&source, &now()).await.unwrap();

    assert!(!verdict.is_busy());
    assert_eq!(source.queried(), vec!["/home/work/"]);
}

#[tokio::test]
async fn test_query_uses_todays_window() {
    let source = FakeSource::new().calendar("/home/", CalendarCollection::new("/home/work/"), vec![]);

    scan(&source, &now()).await.unwrap();

    assert_eq!(*source.windows.borrow(), vec![DayWindow::containing(&now())]);
}

#[tokio::test]
async fn test_failing_home_set_is_skipped() {
    let mut source = FakeSource::new()
        .calendar(
            "/home2/",
            CalendarCollection::new("/home2/work/"),
            vec![event("Sync", "20240601T140000").with(FieldName::DtEnd, "20240601T150000")],
        );
    source.home_sets = vec!["/home/".to_string(), "/home2/".to_string()];
    source.failing_home_sets = vec!["/home/".to_string()];

    let verdict = scan(&source, &now()).await.unwrap();

    assert!(verdict.is_busy());
}

#[tokio::test]
async fn test_principal_failure_is_fatal() {
    let source = FakeSource {
        principal_fails: true,
        ..FakeSource::new()
    };

    let err = scan(&source, &now()).await.unwrap_err();

    assert!(matches!(err, CalNowError::Principal(_)));
    assert!(err.is_fatal());
    assert!(source.queried().is_empty());
}

#[tokio::test]
async fn test_missing_home_set_is_fatal() {
    let source = FakeSource {
        home_sets: vec![],
        ..FakeSource::new()
    };

    let err = scan(&source, &now()).await.unwrap_err();

    assert!(matches!(err, CalNowError::HomeSet(_)));
}
