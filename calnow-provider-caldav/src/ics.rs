//! Extract raw event fields from calendar-data payloads using the icalendar crate's parser.

use calnow_core::RawEvent;
use icalendar::parser::{Component, read_calendar, unfold};

/// Parse ICS content into one [`RawEvent`] per VEVENT.
///
/// Property parameters (e.g. `TZID`) are dropped; values are kept verbatim.
/// Returns `None` when the content is not parseable iCalendar.
pub fn parse_raw_events(content: &str) -> Option<Vec<RawEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;

    let mut events = Vec::new();
    collect_vevents(&calendar.components, &mut events);
    Some(events)
}

fn collect_vevents(components: &[Component<'_>], events: &mut Vec<RawEvent>) {
    for component in components {
        if component.name == "VEVENT" {
            events.push(RawEvent::from_properties(
                component
                    .properties
                    .iter()
                    .map(|p| (p.name.as_ref(), p.val.as_ref())),
            ));
        } else {
            collect_vevents(&component.components, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calnow_core::FieldName;

    #[test]
    fn test_parse_raw_events_keeps_raw_values() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
SUMMARY:Daily \r\n standup\r\n\
DTSTART;TZID=Europe/Berlin:20240601T090000\r\n\
DURATION:PT15M\r\n\
LOCATION:Room 1\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let events = parse_raw_events(ics).expect("Should parse");

        assert_eq!(events.len(), 1, "VTIMEZONE is not an event");
        let event = &events[0];
        assert_eq!(event.uid(), Some("standup@example.com"));
        assert_eq!(event.summary(), Some("Daily standup"));
        assert_eq!(event.get(FieldName::DtStart), Some("20240601T090000"));
        assert_eq!(event.get(FieldName::Duration), Some("PT15M"));
        assert_eq!(event.get(FieldName::DtEnd), None);
    }

    #[test]
    fn test_parse_raw_events_multiple_vevents() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:a
DTSTART:20240601T090000
DTEND:20240601T100000
END:VEVENT
BEGIN:VEVENT
UID:b
DTSTART:20240601T110000Z
DTEND:20240601T120000Z
END:VEVENT
END:VCALENDAR"#;

        let events = parse_raw_events(ics).expect("Should parse");

        let uids: Vec<_> = events.iter().filter_map(|e| e.uid()).collect();
        assert_eq!(uids, vec!["a", "b"]);
        assert_eq!(events[1].get(FieldName::DtStart), Some("20240601T110000Z"));
    }
}
