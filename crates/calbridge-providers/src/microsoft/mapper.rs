//! Translation between Microsoft Graph shapes and the canonical model.
//!
//! Everything here is pure: wire structs, parse/to-native conversions,
//! and path builders. Graph expresses event times as a wall-clock
//! `dateTime` plus a separate `timeZone` name; parsing resolves that
//! pair into a single unambiguous instant. RSVPs are not part of the
//! event body at all — Graph records them through dedicated action
//! endpoints, which is why the response-status mapping here produces a
//! path rather than a body field.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};

use calbridge_core::{
    Attendee, Calendar, CalendarDraft, CalendarEvent, CalendarPermissions, EventDraft, EventTime,
    Provider, ResponseStatus, fallback_color,
};

use crate::error::MapError;

/// Field list for calendar queries.
///
/// Graph omits `hexColor` and the permission flags unless they are
/// explicitly selected, so listing without this breaks the mapping.
pub const CALENDAR_SELECT_FIELDS: &str =
    "id,name,hexColor,isDefaultCalendar,canEdit,canShare,canViewPrivateItems,owner";

// --- Graph wire shapes ---

/// Generic Graph collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphCalendar {
    pub id: String,
    pub name: String,
    pub hex_color: Option<String>,
    pub is_default_calendar: Option<bool>,
    pub can_edit: Option<bool>,
    pub can_share: Option<bool>,
    pub can_view_private_items: Option<bool>,
    pub owner: Option<GraphEmailAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphEmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphEvent {
    pub id: String,
    pub subject: Option<String>,
    pub body: Option<GraphItemBody>,
    pub body_preview: Option<String>,
    pub location: Option<GraphLocation>,
    pub start: Option<GraphDateTimeZone>,
    pub end: Option<GraphDateTimeZone>,
    pub is_all_day: Option<bool>,
    pub attendees: Option<Vec<GraphAttendee>>,
    pub organizer: Option<GraphRecipient>,
    pub response_status: Option<GraphResponseStatus>,
    pub series_master_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub web_link: Option<String>,
    pub change_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphItemBody {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphLocation {
    pub display_name: Option<String>,
}

/// Graph's wall-clock time: a zone-less `dateTime` plus a zone name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphDateTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphAttendee {
    pub email_address: Option<GraphEmailAddress>,
    #[serde(rename = "type")]
    pub attendee_type: Option<String>,
    pub status: Option<GraphResponseStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphRecipient {
    pub email_address: Option<GraphEmailAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphResponseStatus {
    pub response: Option<String>,
}

// --- Path builders ---

/// Path for the calendar collection.
pub fn calendars_path() -> String {
    "/me/calendars".to_string()
}

/// Path for a single calendar.
pub fn calendar_path(calendar_id: &str) -> String {
    format!("/me/calendars/{}", urlencoding::encode(calendar_id))
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

/// Path for the expanded-occurrences view of a calendar.
pub fn calendar_view_path(calendar_id: &str) -> String {
    format!("{}/calendarView", calendar_path(calendar_id))
}

/// Path for the RSVP action matching `status`, or `None` for the
/// no-action sentinel.
pub fn response_action_path(
    calendar_id: &str,
    event_id: &str,
    status: ResponseStatus,
) -> Option<String> {
    let action = match status {
        ResponseStatus::Accepted => "accept",
        ResponseStatus::Declined => "decline",
        ResponseStatus::Tentative => "tentativelyAccept",
        ResponseStatus::Unknown => return None,
    };
    Some(format!("{}/{action}", event_path(calendar_id, event_id)))
}

// --- Status mapping ---

/// Maps a Graph response value to the canonical status.
///
/// Graph reports `organizer` for the account's own events; an organizer
/// has implicitly accepted.
pub(crate) fn parse_response_status(response: Option<&str>) -> ResponseStatus {
    match response {
        Some("accepted") | Some("organizer") => ResponseStatus::Accepted,
        Some("declined") => ResponseStatus::Declined,
        Some("tentativelyAccepted") => ResponseStatus::Tentative,
        _ => ResponseStatus::Unknown,
    }
}

// --- Calendar mapping ---

/// Maps a Graph calendar to the canonical shape.
///
/// `fallback_index` is the calendar's position in the listing, used to
/// assign a palette color when Graph supplies none.
pub(crate) fn parse_calendar(
    account_id: &str,
    native: GraphCalendar,
    fallback_index: usize,
) -> Calendar {
    let color = native
        .hex_color
        .filter(|c| !c.is_empty() && c.as_str() != "auto")
        .unwrap_or_else(|| fallback_color(fallback_index).to_string());

    let can_edit = native.can_edit.unwrap_or(false);
    let permissions = CalendarPermissions {
        can_edit,
        can_share: native.can_share.unwrap_or(false),
        can_view_private_items: native.can_view_private_items.unwrap_or(false),
        owner: native.owner.and_then(|o| o.address),
    };

    Calendar::new(Provider::Microsoft, account_id, native.id, native.name, color)
        .with_default(native.is_default_calendar.unwrap_or(false))
        .with_read_only(!can_edit)
        .with_permissions(permissions)
}

/// Maps a canonical calendar draft to the Graph shape.
///
/// Graph calendars only take a preset color category, not an arbitrary
/// hex value, so a requested color is dropped.
pub(crate) fn calendar_to_native(draft: &CalendarDraft) -> Value {
    json!({ "name": draft.name })
}

// --- Event mapping ---

fn parse_graph_time(native: &GraphDateTimeZone, all_day: bool) -> Result<EventTime, MapError> {
    let naive = parse_wall_clock(&native.date_time)?;
    if all_day {
        return Ok(EventTime::all_day(naive.date()));
    }

    let zone: Tz = native
        .time_zone
        .parse()
        .map_err(|_| MapError::UnknownTimeZone(native.time_zone.clone()))?;

    EventTime::from_local(naive, zone).ok_or_else(|| MapError::InvalidDateTime {
        value: native.date_time.clone(),
        reason: format!("no such local time in zone {zone}"),
    })
}

/// Parses Graph's zone-less datetime, e.g. `2024-01-15T10:00:00.0000000`.
fn parse_wall_clock(value: &str) -> Result<NaiveDateTime, MapError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| MapError::InvalidDateTime {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_attendee(native: GraphAttendee, organizer_email: Option<&str>) -> Option<Attendee> {
    let email = native.email_address.as_ref()?.address.clone()?;
    let is_organizer = organizer_email.is_some_and(|o| o.eq_ignore_ascii_case(&email));
    let status = parse_response_status(
        native
            .status
            .as_ref()
            .and_then(|s| s.response.as_deref()),
    );

    let mut attendee = Attendee::new(email)
        .with_optional(native.attendee_type.as_deref() == Some("optional"))
        .with_organizer(is_organizer)
        .with_response_status(status);
    attendee.display_name = native.email_address.and_then(|e| e.name);
    Some(attendee)
}

/// Maps a Graph event to the canonical shape.
///
/// Events without a start or end are rejected: callers receive either a
/// fully normalized event or an error, never a partial one.
pub(crate) fn parse_event(
    account_id: &str,
    calendar_id: &str,
    native: GraphEvent,
) -> Result<CalendarEvent, MapError> {
    let all_day = native.is_all_day.unwrap_or(false);
    let start = native.start.as_ref().ok_or(MapError::MissingField("start"))?;
    let end = native.end.as_ref().ok_or(MapError::MissingField("end"))?;

    let start = parse_graph_time(start, all_day)?;
    let end = parse_graph_time(end, all_day)?;
    if start > end {
        return Err(MapError::EndBeforeStart);
    }

    let organizer_email = native
        .organizer
        .as_ref()
        .and_then(|o| o.email_address.as_ref())
        .and_then(|e| e.address.clone());

    let attendees = native
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| parse_attendee(a, organizer_email.as_deref()))
        .collect();

    let mut event = CalendarEvent::new(
        Provider::Microsoft,
        account_id,
        calendar_id,
        native.id,
        native.subject.unwrap_or_default(),
        start,
        end,
    );

    event.description = native
        .body
        .and_then(|b| b.content)
        .or(native.body_preview)
        .filter(|s| !s.is_empty());
    event.location = native.location.and_then(|l| l.display_name);
    event.attendees = attendees;
    event.response_status = parse_response_status(
        native
            .response_status
            .as_ref()
            .and_then(|s| s.response.as_deref()),
    );
    event.is_recurring = native.series_master_id.is_some()
        || matches!(
            native.event_type.as_deref(),
            Some("occurrence") | Some("seriesMaster") | Some("exception")
        );
    event.recurring_event_id = native.series_master_id;

    if let Some(link) = native.web_link {
        event.provider_data.insert("webLink".into(), json!(link));
    }
    if let Some(key) = native.change_key {
        event.provider_data.insert("changeKey".into(), json!(key));
    }

    Ok(event)
}

fn time_to_native(time: &EventTime) -> Value {
    match time {
        EventTime::Zoned { utc, zone } => json!({
            "dateTime": utc.with_timezone(zone).format("%Y-%m-%dT%H:%M:%S").to_string(),
            "timeZone": zone.name(),
        }),
        EventTime::AllDay(date) => json!({
            "dateTime": format!("{date}T00:00:00"),
            "timeZone": "UTC",
        }),
    }
}

fn attendee_to_native(attendee: &Attendee) -> Value {
    json!({
        "emailAddress": {
            "address": attendee.email,
            "name": attendee.display_name,
        },
        "type": if attendee.optional { "optional" } else { "required" },
    })
}

/// Maps a canonical event draft to the Graph shape.
///
/// Fields Graph cannot represent in an event body — notably the RSVP,
/// which goes through an action endpoint instead — are dropped.
pub(crate) fn event_to_native(draft: &EventDraft) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("subject".into(), json!(draft.title));
    body.insert("start".into(), time_to_native(&draft.start));
    body.insert("end".into(), time_to_native(&draft.end));
    body.insert("isAllDay".into(), json!(draft.start.is_all_day()));

    if let Some(ref description) = draft.description {
        body.insert(
            "body".into(),
            json!({ "contentType": "text", "content": description }),
        );
    }
    if let Some(ref location) = draft.location {
        body.insert("location".into(), json!({ "displayName": location }));
    }
    if !draft.attendees.is_empty() {
        body.insert(
            "attendees".into(),
            Value::Array(draft.attendees.iter().map(attendee_to_native).collect()),
        );
    }

    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbridge_core::EventResponse;
    use chrono::{TimeZone, Utc};

    fn sample_calendar_json(hex_color: Option<&str>) -> Value {
        json!({
            "id": "cal-1",
            "name": "Work",
            "hexColor": hex_color,
            "isDefaultCalendar": true,
            "canEdit": true,
            "canShare": false,
            "canViewPrivateItems": true,
            "owner": { "name": "Ada", "address": "ada@example.com" }
        })
    }

    fn sample_event_json() -> Value {
        json!({
            "id": "evt-1",
            "subject": "Design review",
            "body": { "contentType": "text", "content": "Agenda attached" },
            "location": { "displayName": "Room 12" },
            "start": { "dateTime": "2024-01-15T10:00:00.0000000", "timeZone": "America/New_York" },
            "end": { "dateTime": "2024-01-15T11:00:00.0000000", "timeZone": "America/New_York" },
            "isAllDay": false,
            "attendees": [
                {
                    "emailAddress": { "address": "ada@example.com", "name": "Ada" },
                    "type": "required",
                    "status": { "response": "accepted" }
                },
                {
                    "emailAddress": { "address": "bob@example.com", "name": "Bob" },
                    "type": "optional",
                    "status": { "response": "notResponded" }
                }
            ],
            "organizer": { "emailAddress": { "address": "ada@example.com", "name": "Ada" } },
            "responseStatus": { "response": "tentativelyAccepted" },
            "webLink": "https://outlook.office.com/calendar/item/evt-1",
            "changeKey": "CQAAABYA"
        })
    }

    #[test]
    fn parse_calendar_maps_flags() {
        let native: GraphCalendar =
            serde_json::from_value(sample_calendar_json(Some("#ff8c00"))).unwrap();
        let calendar = parse_calendar("acct@example.com", native, 0);

        assert_eq!(calendar.provider, Provider::Microsoft);
        assert_eq!(calendar.color, "#ff8c00");
        assert!(calendar.is_default);
        assert!(!calendar.is_read_only);
        assert!(calendar.permissions.can_edit);
        assert!(!calendar.permissions.can_share);
        assert_eq!(
            calendar.permissions.owner.as_deref(),
            Some("ada@example.com")
        );
    }

    #[test]
    fn parse_calendar_falls_back_on_auto_color() {
        for absent in [sample_calendar_json(None), sample_calendar_json(Some("auto"))] {
            let native: GraphCalendar = serde_json::from_value(absent).unwrap();
            let calendar = parse_calendar("acct", native, 4);
            assert_eq!(calendar.color, fallback_color(4));
            assert!(!calendar.color.is_empty());
        }
    }

    #[test]
    fn parse_calendar_is_idempotent() {
        let first: GraphCalendar =
            serde_json::from_value(sample_calendar_json(None)).unwrap();
        let second: GraphCalendar =
            serde_json::from_value(sample_calendar_json(None)).unwrap();
        assert_eq!(parse_calendar("acct", first, 2), parse_calendar("acct", second, 2));
    }

    #[test]
    fn missing_can_edit_means_read_only() {
        let native: GraphCalendar =
            serde_json::from_value(json!({ "id": "c", "name": "Shared" })).unwrap();
        let calendar = parse_calendar("acct", native, 0);
        assert!(calendar.is_read_only);
        assert!(!calendar.permissions.can_edit);
    }

    #[test]
    fn parse_event_resolves_wall_clock_pair() {
        let native: GraphEvent = serde_json::from_value(sample_event_json()).unwrap();
        let event = parse_event("acct@example.com", "cal-1", native).unwrap();

        // 10:00 in New York in January is 15:00 UTC
        assert_eq!(
            event.start.to_utc(),
            Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
        );
        assert_eq!(event.start.zone(), Some(chrono_tz::America::New_York));
        assert!(event.start <= event.end);
        assert_eq!(event.title, "Design review");
        assert_eq!(event.description.as_deref(), Some("Agenda attached"));
        assert_eq!(event.location.as_deref(), Some("Room 12"));
        assert_eq!(event.response_status, ResponseStatus::Tentative);
        assert_eq!(
            event.provider_data["webLink"],
            json!("https://outlook.office.com/calendar/item/evt-1")
        );
    }

    #[test]
    fn parse_event_maps_attendees() {
        let native: GraphEvent = serde_json::from_value(sample_event_json()).unwrap();
        let event = parse_event("acct", "cal-1", native).unwrap();

        assert_eq!(event.attendees.len(), 2);
        let ada = &event.attendees[0];
        assert!(ada.organizer);
        assert_eq!(ada.response_status, ResponseStatus::Accepted);
        let bob = &event.attendees[1];
        assert!(bob.optional);
        assert_eq!(bob.response_status, ResponseStatus::Unknown);
    }

    #[test]
    fn parse_event_all_day() {
        let native: GraphEvent = serde_json::from_value(json!({
            "id": "evt-2",
            "subject": "Offsite",
            "start": { "dateTime": "2024-03-01T00:00:00.0000000", "timeZone": "UTC" },
            "end": { "dateTime": "2024-03-02T00:00:00.0000000", "timeZone": "UTC" },
            "isAllDay": true
        }))
        .unwrap();

        let event = parse_event("acct", "cal-1", native).unwrap();
        assert!(event.is_all_day());
        assert_eq!(event.start.date().to_string(), "2024-03-01");
    }

    #[test]
    fn parse_event_rejects_missing_times() {
        let native: GraphEvent =
            serde_json::from_value(json!({ "id": "evt-3", "subject": "Broken" })).unwrap();
        assert!(matches!(
            parse_event("acct", "cal-1", native),
            Err(MapError::MissingField("start"))
        ));
    }

    #[test]
    fn parse_event_rejects_unknown_zone() {
        let native: GraphEvent = serde_json::from_value(json!({
            "id": "evt-4",
            "start": { "dateTime": "2024-01-15T10:00:00", "timeZone": "Pacific Standard Time" },
            "end": { "dateTime": "2024-01-15T11:00:00", "timeZone": "Pacific Standard Time" }
        }))
        .unwrap();
        assert!(matches!(
            parse_event("acct", "cal-1", native),
            Err(MapError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn parse_event_rejects_inverted_interval() {
        let native: GraphEvent = serde_json::from_value(json!({
            "id": "evt-5",
            "start": { "dateTime": "2024-01-15T11:00:00", "timeZone": "UTC" },
            "end": { "dateTime": "2024-01-15T10:00:00", "timeZone": "UTC" }
        }))
        .unwrap();
        assert!(matches!(
            parse_event("acct", "cal-1", native),
            Err(MapError::EndBeforeStart)
        ));
    }

    #[test]
    fn recurring_instance_keeps_series_id() {
        let native: GraphEvent = serde_json::from_value(json!({
            "id": "evt-6",
            "type": "occurrence",
            "seriesMasterId": "series-1",
            "start": { "dateTime": "2024-01-15T10:00:00", "timeZone": "UTC" },
            "end": { "dateTime": "2024-01-15T10:30:00", "timeZone": "UTC" }
        }))
        .unwrap();

        let event = parse_event("acct", "cal-1", native).unwrap();
        assert!(event.is_recurring);
        assert_eq!(event.recurring_event_id.as_deref(), Some("series-1"));
    }

    #[test]
    fn round_trip_preserves_supported_fields() {
        let zone = chrono_tz::Europe::Paris;
        let start = EventTime::zoned(Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap(), zone);
        let end = EventTime::zoned(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap(), zone);
        let draft = EventDraft::new("Retro", start.clone(), end.clone())
            .unwrap()
            .with_description("What went well")
            .with_location("Paris office")
            .with_attendee(Attendee::new("bob@example.com").with_optional(true))
            .with_response(EventResponse::new(ResponseStatus::Accepted));

        let mut native = event_to_native(&draft);
        native["id"] = json!("evt-7");
        let parsed: GraphEvent = serde_json::from_value(native).unwrap();
        let event = parse_event("acct", "cal-1", parsed).unwrap();

        assert_eq!(event.title, draft.title);
        assert_eq!(event.description, draft.description);
        assert_eq!(event.location, draft.location);
        assert_eq!(event.start, start);
        assert_eq!(event.end, end);
        assert_eq!(event.attendees.len(), 1);
        assert!(event.attendees[0].optional);
        // the RSVP travels through the action endpoint, not the body
        assert_eq!(event.response_status, ResponseStatus::Unknown);
    }

    #[test]
    fn response_action_paths() {
        assert_eq!(
            response_action_path("cal-1", "evt-1", ResponseStatus::Accepted).unwrap(),
            "/me/calendars/cal-1/events/evt-1/accept"
        );
        assert_eq!(
            response_action_path("cal-1", "evt-1", ResponseStatus::Declined).unwrap(),
            "/me/calendars/cal-1/events/evt-1/decline"
        );
        assert_eq!(
            response_action_path("cal-1", "evt-1", ResponseStatus::Tentative).unwrap(),
            "/me/calendars/cal-1/events/evt-1/tentativelyAccept"
        );
        assert!(response_action_path("cal-1", "evt-1", ResponseStatus::Unknown).is_none());
    }

    #[test]
    fn paths_escape_identifiers() {
        assert_eq!(
            event_path("AAMk/2==", "evt 1"),
            "/me/calendars/AAMk%2F2%3D%3D/events/evt%201"
        );
    }

    #[test]
    fn select_covers_every_mapped_field() {
        for field in [
            "hexColor",
            "isDefaultCalendar",
            "canEdit",
            "canShare",
            "canViewPrivateItems",
            "owner",
        ] {
            assert!(CALENDAR_SELECT_FIELDS.contains(field), "missing {field}");
        }
    }

    #[test]
    fn calendar_draft_drops_color() {
        let draft = CalendarDraft::new("Team").with_color("#123456");
        let native = calendar_to_native(&draft);
        assert_eq!(native, json!({ "name": "Team" }));
    }
}
