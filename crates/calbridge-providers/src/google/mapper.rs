//! Translation between Google Calendar v3 shapes and the canonical model.
//!
//! Pure wire structs, parse/to-native conversions, and path builders.
//! Unlike Graph, Google expresses RSVPs inside the event body: the
//! authenticated user's attendee entry carries a `responseStatus`, so
//! recording a response is a body field, not a separate action call.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};

use calbridge_core::{
    Attendee, Calendar, CalendarDraft, CalendarEvent, CalendarPermissions, EventDraft, EventTime,
    Provider, ResponseStatus, fallback_color,
};

use crate::error::MapError;

// --- Google wire shapes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleCalendarList {
    #[serde(default)]
    pub items: Vec<GoogleCalendarListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleCalendarListEntry {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
    pub background_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
    pub status: Option<String>,
    pub attendees: Option<Vec<GoogleAttendee>>,
    pub recurring_event_id: Option<String>,
    pub recurrence: Option<Vec<String>>,
    pub html_link: Option<String>,
    pub etag: Option<String>,
}

/// Google's event time: RFC3339 `dateTime` for timed events, `date`
/// for all-day ones, with an optional display `timeZone`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEventTime {
    pub date: Option<String>,
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleAttendee {
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub organizer: bool,
    #[serde(rename = "self", default)]
    pub is_self: bool,
    pub response_status: Option<String>,
}

// --- Path builders ---

/// Path for the account's calendar list.
pub fn calendar_list_path() -> String {
    "/users/me/calendarList".to_string()
}

/// Path for the calendar collection.
pub fn calendars_path() -> String {
    "/calendars".to_string()
}

/// Path for a single calendar.
pub fn calendar_path(calendar_id: &str) -> String {
    format!("/calendars/{}", urlencoding::encode(calendar_id))
}

/// Path for a calendar's event collection.
pub fn events_path(calendar_id: &str) -> String {
    format!("{}/events", calendar_path(calendar_id))
}

/// Path for a single event.
pub fn event_path(calendar_id: &str, event_id: &str) -> String {
    format!(
        "{}/events/{}",
        calendar_path(calendar_id),
        urlencoding::encode(event_id)
    )
}

// --- Status mapping ---

/// Maps a Google `responseStatus` value to the canonical status.
pub(crate) fn parse_response_status(response: Option<&str>) -> ResponseStatus {
    match response {
        Some("accepted") => ResponseStatus::Accepted,
        Some("declined") => ResponseStatus::Declined,
        Some("tentative") => ResponseStatus::Tentative,
        _ => ResponseStatus::Unknown,
    }
}

/// Maps a canonical status to the Google wire value, or `None` for the
/// no-action sentinel.
pub(crate) fn response_status_to_native(status: ResponseStatus) -> Option<&'static str> {
    match status {
        ResponseStatus::Accepted => Some("accepted"),
        ResponseStatus::Declined => Some("declined"),
        ResponseStatus::Tentative => Some("tentative"),
        ResponseStatus::Unknown => None,
    }
}

/// Builds the PATCH body that records `account_id`'s own RSVP, or
/// `None` for the no-action sentinel.
pub(crate) fn response_patch_body(account_id: &str, status: ResponseStatus) -> Option<Value> {
    let native = response_status_to_native(status)?;
    Some(json!({
        "attendees": [
            { "email": account_id, "responseStatus": native, "self": true }
        ]
    }))
}

// --- Calendar mapping ---

fn permissions_for_role(account_id: &str, access_role: Option<&str>) -> CalendarPermissions {
    match access_role {
        Some("owner") => CalendarPermissions::owner(account_id),
        Some("writer") => CalendarPermissions::writer(),
        _ => CalendarPermissions::read_only(),
    }
}

/// Maps a calendar-list entry to the canonical shape.
///
/// `fallback_index` is the calendar's position in the listing, used to
/// assign a palette color when the entry carries none.
pub(crate) fn parse_calendar(
    account_id: &str,
    native: GoogleCalendarListEntry,
    fallback_index: usize,
) -> Calendar {
    let color = native
        .background_color
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| fallback_color(fallback_index).to_string());

    let permissions = permissions_for_role(account_id, native.access_role.as_deref());
    let is_read_only = !permissions.can_edit;

    Calendar::new(Provider::Google, account_id, native.id, native.summary, color)
        .with_default(native.primary)
        .with_read_only(is_read_only)
        .with_permissions(permissions)
}

/// Maps a canonical calendar draft to the Google shape.
///
/// Calendar colors live on the per-user calendar-list entry, not the
/// calendar resource, so a requested color is dropped.
pub(crate) fn calendar_to_native(draft: &CalendarDraft) -> Value {
    json!({ "summary": draft.name })
}

/// Maps a bare calendar resource (as returned by create/update) to the
/// canonical shape. These responses carry no role or color, so the
/// account is assumed to own what it just created.
pub(crate) fn parse_owned_calendar(account_id: &str, native: Value) -> Result<Calendar, MapError> {
    #[derive(Debug, Deserialize)]
    struct GoogleCalendarResource {
        id: String,
        summary: String,
    }

    let resource: GoogleCalendarResource = serde_json::from_value(native)?;
    Ok(Calendar::new(
        Provider::Google,
        account_id,
        resource.id,
        resource.summary,
        fallback_color(0),
    )
    .with_permissions(CalendarPermissions::owner(account_id)))
}

// --- Event mapping ---

fn parse_google_time(native: &GoogleEventTime, field: &'static str) -> Result<EventTime, MapError> {
    if let Some(ref date_time) = native.date_time {
        let instant = DateTime::parse_from_rfc3339(date_time)
            .map_err(|e| MapError::InvalidDateTime {
                value: date_time.clone(),
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);

        let zone = match native.time_zone {
            Some(ref name) => name
                .parse::<Tz>()
                .map_err(|_| MapError::UnknownTimeZone(name.clone()))?,
            None => Tz::UTC,
        };

        Ok(EventTime::zoned(instant, zone))
    } else if let Some(ref date) = native.date {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
            MapError::InvalidDateTime {
                value: date.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(EventTime::all_day(parsed))
    } else {
        Err(MapError::MissingField(field))
    }
}

fn parse_attendee(native: GoogleAttendee) -> Option<Attendee> {
    let email = native.email?;
    let mut attendee = Attendee::new(email)
        .with_optional(native.optional)
        .with_organizer(native.organizer)
        .with_response_status(parse_response_status(native.response_status.as_deref()));
    attendee.display_name = native.display_name;
    Some(attendee)
}

/// Maps a Google event to the canonical shape.
///
/// The authenticated user's own response state is read from the `self`
/// attendee entry. Cancelled events are not filtered here; their native
/// status rides along in `provider_data`.
pub(crate) fn parse_event(
    account_id: &str,
    calendar_id: &str,
    native: GoogleEvent,
) -> Result<CalendarEvent, MapError> {
    let start = native.start.as_ref().ok_or(MapError::MissingField("start"))?;
    let end = native.end.as_ref().ok_or(MapError::MissingField("end"))?;

    let start = parse_google_time(start, "start")?;
    let end = parse_google_time(end, "end")?;
    if start > end {
        return Err(MapError::EndBeforeStart);
    }

    let own_status = native
        .attendees
        .as_ref()
        .and_then(|list| {
            list.iter()
                .find(|a| a.is_self || a.email.as_deref() == Some(account_id))
        })
        .map(|a| parse_response_status(a.response_status.as_deref()))
        .unwrap_or_default();

    let attendees: Vec<Attendee> = native
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(parse_attendee)
        .collect();

    let mut event = CalendarEvent::new(
        Provider::Google,
        account_id,
        calendar_id,
        native.id,
        native.summary.unwrap_or_default(),
        start,
        end,
    );

    event.description = native.description.filter(|s| !s.is_empty());
    event.location = native.location;
    event.attendees = attendees;
    event.response_status = own_status;
    event.is_recurring = native.recurring_event_id.is_some() || native.recurrence.is_some();
    event.recurring_event_id = native.recurring_event_id;

    if let Some(link) = native.html_link {
        event.provider_data.insert("htmlLink".into(), json!(link));
    }
    if let Some(etag) = native.etag {
        event.provider_data.insert("etag".into(), json!(etag));
    }
    if let Some(status) = native.status {
        event.provider_data.insert("status".into(), json!(status));
    }

    Ok(event)
}

fn time_to_native(time: &EventTime) -> Value {
    match time {
        EventTime::Zoned { utc, zone } => json!({
            "dateTime": utc
                .with_timezone(zone)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            "timeZone": zone.name(),
        }),
        EventTime::AllDay(date) => json!({ "date": date.to_string() }),
    }
}

fn attendee_to_native(attendee: &Attendee) -> Value {
    let mut native = serde_json::Map::new();
    native.insert("email".into(), json!(attendee.email));
    if let Some(ref name) = attendee.display_name {
        native.insert("displayName".into(), json!(name));
    }
    if attendee.optional {
        native.insert("optional".into(), json!(true));
    }
    if let Some(status) = response_status_to_native(attendee.response_status) {
        native.insert("responseStatus".into(), json!(status));
    }
    Value::Object(native)
}

/// Maps a canonical event draft to the Google shape.
///
/// A populated, actionable response folds into the attendee list as
/// `account_id`'s own entry — Google has no separate RSVP endpoint, so
/// the response travels in the same body as the rest of the mutation.
pub(crate) fn event_to_native(draft: &EventDraft, account_id: &str) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("summary".into(), json!(draft.title));
    body.insert("start".into(), time_to_native(&draft.start));
    body.insert("end".into(), time_to_native(&draft.end));

    if let Some(ref description) = draft.description {
        body.insert("description".into(), json!(description));
    }
    if let Some(ref location) = draft.location {
        body.insert("location".into(), json!(location));
    }

    let mut attendees: Vec<Value> = draft.attendees.iter().map(attendee_to_native).collect();
    if let Some(response) = draft.response
        && let Some(native) = response_status_to_native(response.status)
    {
        match attendees
            .iter_mut()
            .find(|a| a["email"].as_str() == Some(account_id))
        {
            Some(own) => {
                own["responseStatus"] = json!(native);
            }
            None => attendees.push(json!({
                "email": account_id,
                "responseStatus": native,
                "self": true,
            })),
        }
    }
    if !attendees.is_empty() {
        body.insert("attendees".into(), Value::Array(attendees));
    }

    Value::Object(body)
}
