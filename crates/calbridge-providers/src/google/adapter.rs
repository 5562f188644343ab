//! Google Calendar adapter.

use chrono::SecondsFormat;
use chrono_tz::Tz;
use tracing::debug;

use calbridge_core::{
    Calendar, CalendarDraft, CalendarEvent, EventDraft, EventResponse, Provider, TimeWindow,
};

use crate::error::{ApiError, CallError, MapError, ProviderResult, enveloped};
use crate::http::{ApiClient, ApiRequest, BearerClient, require_body};
use crate::provider::{BoxFuture, CalendarProvider, MAX_EVENTS_PER_CALENDAR};

use super::mapper::{self, GoogleCalendarList, GoogleEvent, GoogleEventList};

/// Base URL for the Google Calendar API v3.
pub const CALENDAR_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar adapter for Google Calendar.
///
/// One instance is scoped to a single account: the access token is
/// captured at construction and presented on every request for the
/// adapter's lifetime. The `account_id` is the authenticated account's
/// email, which is also how Google identifies the user's own attendee
/// entry when recording RSVPs.
pub struct GoogleAdapter<C = BearerClient> {
    client: C,
    account_id: String,
}

impl GoogleAdapter<BearerClient> {
    /// Creates an adapter talking to the production Calendar endpoint.
    pub fn new(
        access_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: BearerClient::new(CALENDAR_API_BASE_URL, access_token)?,
            account_id: account_id.into(),
        })
    }
}

impl<C: ApiClient> GoogleAdapter<C> {
    /// Creates an adapter over an injected client.
    pub fn with_client(client: C, account_id: impl Into<String>) -> Self {
        Self {
            client,
            account_id: account_id.into(),
        }
    }

    async fn list_calendars_impl(&self) -> Result<Vec<Calendar>, CallError> {
        let request = ApiRequest::get(mapper::calendar_list_path());
        let body = require_body(self.client.execute(request).await?)?;
        let list: GoogleCalendarList = serde_json::from_value(body).map_err(MapError::from)?;

        debug!(count = list.items.len(), "listed google calendars");
        Ok(list
            .items
            .into_iter()
            .enumerate()
            .map(|(index, native)| mapper::parse_calendar(&self.account_id, native, index))
            .collect())
    }

    async fn create_calendar_impl(&self, draft: &CalendarDraft) -> Result<Calendar, CallError> {
        let request = ApiRequest::post(mapper::calendars_path(), mapper::calendar_to_native(draft));
        let body = require_body(self.client.execute(request).await?)?;
        mapper::parse_owned_calendar(&self.account_id, body).map_err(CallError::from)
    }

    async fn update_calendar_impl(
        &self,
        calendar_id: &str,
        draft: &CalendarDraft,
    ) -> Result<Calendar, CallError> {
        let request = ApiRequest::patch(
            mapper::calendar_path(calendar_id),
            mapper::calendar_to_native(draft),
        );
        let body = require_body(self.client.execute(request).await?)?;
        mapper::parse_owned_calendar(&self.account_id, body).map_err(CallError::from)
    }

    async fn delete_impl(&self, path: String) -> Result<(), CallError> {
        self.client.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    async fn list_events_impl(
        &self,
        calendar: &Calendar,
        window: TimeWindow,
        zone: Tz,
    ) -> Result<Vec<CalendarEvent>, CallError> {
        let request = ApiRequest::get(mapper::events_path(&calendar.id))
            .with_query(
                "timeMin",
                window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with_query(
                "timeMax",
                window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with_query("timeZone", zone.name())
            .with_query("singleEvents", "true")
            .with_query("orderBy", "startTime")
            .with_query("maxResults", MAX_EVENTS_PER_CALENDAR.to_string());

        let body = require_body(self.client.execute(request).await?)?;
        let list: GoogleEventList = serde_json::from_value(body).map_err(MapError::from)?;

        debug!(
            count = list.items.len(),
            calendar_id = %calendar.id,
            "fetched google events"
        );
        list.items
            .into_iter()
            .map(|native| mapper::parse_event(&self.account_id, &calendar.id, native))
            .collect::<Result<Vec<_>, MapError>>()
            .map_err(CallError::from)
    }

    async fn create_event_impl(
        &self,
        calendar: &Calendar,
        draft: &EventDraft,
    ) -> Result<CalendarEvent, CallError> {
        let request = ApiRequest::post(
            mapper::events_path(&calendar.id),
            mapper::event_to_native(draft, &self.account_id),
        );
        let body = require_body(self.client.execute(request).await?)?;
        let native: GoogleEvent = serde_json::from_value(body).map_err(MapError::from)?;
        mapper::parse_event(&self.account_id, &calendar.id, native).map_err(CallError::from)
    }

    async fn patch_event_impl(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<CalendarEvent, CallError> {
        let mut request = ApiRequest::patch(
            mapper::event_path(calendar_id, event_id),
            mapper::event_to_native(draft, &self.account_id),
        );
        if let Some(response) = draft.response {
            request = request.with_query("sendUpdates", send_updates_value(response));
        }

        let body = require_body(self.client.execute(request).await?)?;
        let native: GoogleEvent = serde_json::from_value(body).map_err(MapError::from)?;
        mapper::parse_event(&self.account_id, calendar_id, native).map_err(CallError::from)
    }

    async fn patch_response_impl(
        &self,
        calendar_id: &str,
        event_id: &str,
        body: serde_json::Value,
        response: EventResponse,
    ) -> Result<(), CallError> {
        let request = ApiRequest::patch(mapper::event_path(calendar_id, event_id), body)
            .with_query("sendUpdates", send_updates_value(response));
        self.client.execute(request).await?;
        Ok(())
    }
}

fn send_updates_value(response: EventResponse) -> &'static str {
    if response.send_update { "all" } else { "none" }
}

impl<C: ApiClient> CalendarProvider for GoogleAdapter<C> {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>> {
        Box::pin(enveloped("google.calendars", &[], self.list_calendars_impl()))
    }

    fn create_calendar(&self, draft: CalendarDraft) -> BoxFuture<'_, ProviderResult<Calendar>> {
        Box::pin(async move {
            enveloped("google.create_calendar", &[], self.create_calendar_impl(&draft)).await
        })
    }

    fn update_calendar<'a>(
        &'a self,
        calendar_id: &'a str,
        draft: CalendarDraft,
    ) -> BoxFuture<'a, ProviderResult<Calendar>> {
        Box::pin(async move {
            enveloped(
                "google.update_calendar",
                &[("calendar_id", calendar_id)],
                self.update_calendar_impl(calendar_id, &draft),
            )
            .await
        })
    }

    fn delete_calendar<'a>(&'a self, calendar_id: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            enveloped(
                "google.delete_calendar",
                &[("calendar_id", calendar_id)],
                self.delete_impl(mapper::calendar_path(calendar_id)),
            )
            .await
        })
    }

    fn events<'a>(
        &'a self,
        calendar: &'a Calendar,
        window: TimeWindow,
        zone: Tz,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            enveloped(
                "google.events",
                &[("calendar_id", calendar.id.as_str())],
                self.list_events_impl(calendar, window, zone),
            )
            .await
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar: &'a Calendar,
        draft: EventDraft,
    ) -> BoxFuture<'a, ProviderResult<CalendarEvent>> {
        Box::pin(async move {
            enveloped(
                "google.create_event",
                &[("calendar_id", calendar.id.as_str())],
                self.create_event_impl(calendar, &draft),
            )
            .await
        })
    }

    fn update_event<'a>(
        &'a self,
        calendar: &'a Calendar,
        event_id: &'a str,
        draft: EventDraft,
    ) -> BoxFuture<'a, ProviderResult<CalendarEvent>> {
        // The RSVP, when present, rides in the same PATCH body as the
        // rest of the mutation; no follow-up call is needed.
        Box::pin(async move {
            enveloped(
                "google.update_event",
                &[
                    ("calendar_id", calendar.id.as_str()),
                    ("event_id", event_id),
                ],
                self.patch_event_impl(&calendar.id, event_id, &draft),
            )
            .await
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            enveloped(
                "google.delete_event",
                &[("calendar_id", calendar_id), ("event_id", event_id)],
                self.delete_impl(mapper::event_path(calendar_id, event_id)),
            )
            .await
        })
    }

    fn respond_to_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        response: EventResponse,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        // "unknown" means no action was requested: resolve immediately,
        // without touching the network.
        let Some(body) = mapper::response_patch_body(&self.account_id, response.status) else {
            return Box::pin(async { Ok(()) });
        };

        Box::pin(async move {
            enveloped(
                "google.respond_to_event",
                &[("calendar_id", calendar_id), ("event_id", event_id)],
                self.patch_response_impl(calendar_id, event_id, body, response),
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::http::fake::FakeClient;
    use calbridge_core::{EventTime, ResponseStatus};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const ACCOUNT: &str = "user@gmail.com";

    fn adapter_with(client: FakeClient) -> GoogleAdapter<FakeClient> {
        GoogleAdapter::with_client(client, ACCOUNT)
    }

    fn personal_calendar() -> Calendar {
        Calendar::new(Provider::Google, ACCOUNT, "primary", "Personal", "#9fe1e7")
    }

    fn google_event_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "summary": "Standup",
            "start": { "dateTime": "2024-01-10T09:00:00Z" },
            "end": { "dateTime": "2024-01-10T09:15:00Z" }
        })
    }

    fn sample_draft() -> EventDraft {
        EventDraft::new(
            "Standup",
            EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()),
            EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 10, 9, 15, 0).unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn calendars_lists_with_fallback_colors() {
        let client = FakeClient::new();
        client.push_json(json!({
            "items": [
                { "id": "primary", "summary": "Personal", "primary": true, "accessRole": "owner", "backgroundColor": "#9fe1e7" },
                { "id": "team", "summary": "Team", "accessRole": "reader" }
            ]
        }));
        let adapter = adapter_with(client);

        let calendars = adapter.calendars().await.unwrap();

        let recorded = adapter.client.recorded();
        assert_eq!(recorded[0].path, "/users/me/calendarList");

        assert_eq!(calendars[0].color, "#9fe1e7");
        assert!(calendars[0].is_default);
        assert_eq!(calendars[1].color, calbridge_core::fallback_color(1));
        assert!(calendars[1].is_read_only);
    }

    #[tokio::test]
    async fn events_queries_window_zone_order_and_cap() {
        let client = FakeClient::new();
        client.push_json(json!({ "items": [google_event_json("evt-1")] }));
        let adapter = adapter_with(client);

        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap(),
        );
        let events = adapter
            .events(&personal_calendar(), window, chrono_tz::America::New_York)
            .await
            .unwrap();

        let request = &adapter.client.recorded()[0];
        assert_eq!(request.path, "/calendars/primary/events");
        assert_eq!(request.query_value("timeMin"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(request.query_value("timeMax"), Some("2024-01-31T23:59:00Z"));
        assert_eq!(
            request.query_value("timeZone"),
            Some("America/New_York")
        );
        assert_eq!(request.query_value("singleEvents"), Some("true"));
        assert_eq!(request.query_value("orderBy"), Some("startTime"));
        assert_eq!(request.query_value("maxResults"), Some("250"));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].provider, Provider::Google);
    }

    #[tokio::test]
    async fn update_event_is_a_single_patch_with_folded_rsvp() {
        let client = FakeClient::new();
        client.push_json(google_event_json("evt-1"));
        let adapter = adapter_with(client);

        let draft = sample_draft()
            .with_response(EventResponse::new(ResponseStatus::Accepted).with_send_update(true));
        adapter
            .update_event(&personal_calendar(), "evt-1", draft)
            .await
            .unwrap();

        let recorded = adapter.client.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, Method::Patch);
        assert_eq!(recorded[0].path, "/calendars/primary/events/evt-1");
        assert_eq!(recorded[0].query_value("sendUpdates"), Some("all"));

        let attendees = recorded[0].body.as_ref().unwrap()["attendees"]
            .as_array()
            .unwrap();
        assert_eq!(attendees[0]["email"], json!(ACCOUNT));
        assert_eq!(attendees[0]["responseStatus"], json!("accepted"));
    }

    #[tokio::test]
    async fn respond_unknown_is_a_no_op() {
        let adapter = adapter_with(FakeClient::new());

        adapter
            .respond_to_event("primary", "evt-1", EventResponse::new(ResponseStatus::Unknown))
            .await
            .unwrap();

        assert!(adapter.client.recorded().is_empty());
    }

    #[tokio::test]
    async fn respond_patches_own_attendee_entry() {
        let client = FakeClient::new();
        client.push_empty();
        let adapter = adapter_with(client);

        adapter
            .respond_to_event(
                "primary",
                "evt-1",
                EventResponse::new(ResponseStatus::Declined),
            )
            .await
            .unwrap();

        let recorded = adapter.client.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, Method::Patch);
        assert_eq!(recorded[0].query_value("sendUpdates"), Some("none"));
        let body = recorded[0].body.as_ref().unwrap();
        assert_eq!(body["attendees"][0]["responseStatus"], json!("declined"));
    }

    #[tokio::test]
    async fn failures_surface_as_one_provider_error() {
        let client = FakeClient::new();
        client.push_error(ApiError::Status {
            status: 403,
            body: "forbidden".into(),
        });
        let adapter = adapter_with(client);

        let err = adapter
            .delete_calendar("team@group.calendar.google.com")
            .await
            .unwrap_err();
        assert_eq!(err.operation(), "google.delete_calendar");
        assert_eq!(
            err.context().get("calendar_id").unwrap(),
            "team@group.calendar.google.com"
        );
    }

    #[tokio::test]
    async fn create_calendar_returns_owned_canonical_calendar() {
        let client = FakeClient::new();
        client.push_json(json!({ "id": "cal-9", "summary": "Projects" }));
        let adapter = adapter_with(client);

        let calendar = adapter
            .create_calendar(CalendarDraft::new("Projects"))
            .await
            .unwrap();

        let recorded = adapter.client.recorded();
        assert_eq!(recorded[0].method, Method::Post);
        assert_eq!(recorded[0].path, "/calendars");
        assert_eq!(recorded[0].body.as_ref().unwrap()["summary"], json!("Projects"));

        assert_eq!(calendar.name, "Projects");
        assert!(!calendar.color.is_empty());
        assert!(calendar.permissions.can_edit);
    }
}
