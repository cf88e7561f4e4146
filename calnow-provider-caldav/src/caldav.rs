//! CalDAV client helpers using libdav.
//!
//! Provides the HTTP stack behind the libdav client and the two requests
//! libdav does not ship: calendar listing with component sets, and a
//! time-range calendar-query that asks only for the properties calnow reads.

use anyhow::{Context, Result};
use calnow_core::{CalendarCollection, FieldName};
use chrono::{DateTime, Utc};
use http::{Method, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};

/// Type alias for the HTTP client with auth and redirect following.
type HttpClient = FollowRedirect<
    AddAuthorization<
        Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, String>,
    >,
>;

/// Type alias for our CalDAV client.
pub type CalNowCalDavClient = CalDavClient<HttpClient>;

const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// Create a libdav CalDavClient for `base_url`.
///
/// The client is configured with:
/// - Basic authentication using the provided credentials
/// - Automatic redirect following (servers often redirect to a per-user host)
/// - HTTPS support, plain HTTP allowed
pub fn create_caldav_client(base_url: &str, username: &str, password: &str) -> Result<CalNowCalDavClient> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid base URL: {}", base_url))?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    let auth_client = AddAuthorization::basic(http_client, username, password);

    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(auth_client);

    let webdav = WebDavClient::new(uri, client);
    Ok(CalDavClient::new(webdav))
}

/// Format an instant for CalDAV time-range queries: `YYYYMMDDTHHMMSSZ`.
pub fn format_caldav_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y%m%dT%H%M%SZ").to_string()
}

// ============================================================================
// Calendar listing
// ============================================================================

/// PROPFIND (Depth 1) on a calendar home set listing its calendar collections.
pub struct FindCalendarCollections<'a> {
    home_set_href: &'a str,
}

impl<'a> FindCalendarCollections<'a> {
    pub fn new(home_set_href: &'a str) -> Self {
        Self { home_set_href }
    }
}

/// Response from a [`FindCalendarCollections`] request.
#[derive(Debug)]
pub struct FindCalendarCollectionsResponse {
    pub calendars: Vec<CalendarCollection>,
}

impl DavRequest for FindCalendarCollections<'_> {
    type Response = FindCalendarCollectionsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<propfind xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <displayname/>
        <resourcetype/>
        <C:supported-calendar-component-set/>
    </prop>
</propfind>"#
            .to_string();

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_set_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let calendars = parse_calendar_collections(body)?;
        Ok(FindCalendarCollectionsResponse { calendars })
    }
}

/// Parse calendar collections from a PROPFIND multistatus response.
///
/// Only responses whose resourcetype has a CalDAV `calendar` child count.
/// A missing or empty `supported-calendar-component-set` leaves the
/// component set unrestricted.
pub fn parse_calendar_collections(body: &[u8]) -> std::result::Result<Vec<CalendarCollection>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut calendars = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string());

        let Some(href) = href else { continue };

        let is_calendar = response
            .descendants()
            .filter(|n| n.tag_name().name() == "resourcetype")
            .flat_map(|n| n.children())
            .any(|n| n.tag_name().name() == "calendar" && n.tag_name().namespace() == Some(CALDAV_NS));

        if !is_calendar {
            continue;
        }

        let name = response
            .descendants()
            .find(|n| n.tag_name().name() == "displayname")
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let components: Vec<String> = response
            .descendants()
            .filter(|n| n.tag_name().name() == "supported-calendar-component-set")
            .flat_map(|n| n.children())
            .filter(|n| n.tag_name().name() == "comp")
            .filter_map(|n| n.attribute("name"))
            .map(|s| s.to_string())
            .collect();

        calendars.push(CalendarCollection {
            path: href,
            name,
            supported_components: (!components.is_empty()).then_some(components),
        });
    }

    Ok(calendars)
}

// ============================================================================
// Custom CalDAV request for time-range filtered calendar queries
// ============================================================================

/// Request to fetch the VEVENTs of a calendar overlapping a time range.
///
/// Uses the CalDAV calendar-query REPORT with a time-range filter and asks
/// for only the properties in [`FieldName::ALL`].
pub struct QueryEventsInRange<'a> {
    collection_href: &'a str,
    start: String,
    end: String,
}

impl<'a> QueryEventsInRange<'a> {
    pub fn new(collection_href: &'a str, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Self {
        Self {
            collection_href,
            start: format_caldav_datetime(start),
            end: format_caldav_datetime(end),
        }
    }
}

/// A fetched calendar resource with its ICS data.
#[derive(Debug)]
pub struct CalendarResource {
    pub href: String,
    pub data: String,
}

/// Response from a [`QueryEventsInRange`] request.
#[derive(Debug)]
pub struct QueryEventsInRangeResponse {
    pub resources: Vec<CalendarResource>,
}

impl DavRequest for QueryEventsInRange<'_> {
    type Response = QueryEventsInRangeResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let props: String = FieldName::ALL
            .iter()
            .map(|field| format!("\n                    <C:prop name=\"{}\"/>", field))
            .collect();

        let body = format!(
            r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <C:calendar-data>
            <C:comp name="VCALENDAR">
                <C:comp name="VEVENT">{}
                </C:comp>
            </C:comp>
        </C:calendar-data>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            props, self.start, self.end
        );

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let resources = parse_calendar_resources(body)?;
        Ok(QueryEventsInRangeResponse { resources })
    }
}

/// Parse calendar resources from a CalDAV multistatus response.
pub fn parse_calendar_resources(body: &[u8]) -> std::result::Result<Vec<CalendarResource>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut resources = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        let Some(href) = href else { continue };

        let data = response
            .descendants()
            .find(|n| n.tag_name().name() == "calendar-data")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        // Only include resources that have calendar data
        if let Some(data) = data {
            resources.push(CalendarResource { href, data });
        }
    }

    Ok(resources)
}
