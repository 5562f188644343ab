//! Microsoft Graph calendar adapter.

use chrono::SecondsFormat;
use chrono_tz::Tz;
use serde_json::json;
use tracing::debug;

use calbridge_core::{
    Calendar, CalendarDraft, CalendarEvent, EventDraft, EventResponse, Provider, TimeWindow,
};

use crate::error::{ApiError, CallError, MapError, ProviderResult, enveloped};
use crate::http::{ApiClient, ApiRequest, BearerClient, require_body};
use crate::provider::{BoxFuture, CalendarProvider, MAX_EVENTS_PER_CALENDAR};

use super::mapper::{self, GraphCalendar, GraphEvent, GraphList};

/// Base URL for the Microsoft Graph API.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Calendar adapter for Microsoft 365 via the Graph API.
///
/// One instance is scoped to a single account: the access token is
/// captured at construction and presented on every request for the
/// adapter's lifetime. Refreshing it is the caller's auth layer's job.
pub struct MicrosoftAdapter<C = BearerClient> {
    client: C,
    account_id: String,
}

impl MicrosoftAdapter<BearerClient> {
    /// Creates an adapter talking to the production Graph endpoint.
    pub fn new(
        access_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: BearerClient::new(GRAPH_BASE_URL, access_token)?,
            account_id: account_id.into(),
        })
    }
}

impl<C: ApiClient> MicrosoftAdapter<C> {
    /// Creates an adapter over an injected client.
    pub fn with_client(client: C, account_id: impl Into<String>) -> Self {
        Self {
            client,
            account_id: account_id.into(),
        }
    }

    async fn list_calendars_impl(&self) -> Result<Vec<Calendar>, CallError> {
        // Graph omits hexColor and the permission flags without $select.
        let request = ApiRequest::get(mapper::calendars_path())
            .with_query("$select", mapper::CALENDAR_SELECT_FIELDS);

        let body = require_body(self.client.execute(request).await?)?;
        let list: GraphList<GraphCalendar> =
            serde_json::from_value(body).map_err(MapError::from)?;

        debug!(count = list.value.len(), "listed microsoft calendars");
        Ok(list
            .value
            .into_iter()
            .enumerate()
            .map(|(index, native)| mapper::parse_calendar(&self.account_id, native, index))
            .collect())
    }

    async fn create_calendar_impl(&self, draft: &CalendarDraft) -> Result<Calendar, CallError> {
        let request = ApiRequest::post(mapper::calendars_path(), mapper::calendar_to_native(draft));
        let body = require_body(self.client.execute(request).await?)?;
        let native: GraphCalendar = serde_json::from_value(body).map_err(MapError::from)?;
        Ok(mapper::parse_calendar(&self.account_id, native, 0))
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
        let native: GraphCalendar = serde_json::from_value(body).map_err(MapError::from)?;
        Ok(mapper::parse_calendar(&self.account_id, native, 0))
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
        let request = ApiRequest::get(mapper::calendar_view_path(&calendar.id))
            .with_query(
                "startDateTime",
                window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with_query(
                "endDateTime",
                window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with_query("$orderby", "start/dateTime")
            .with_query("$top", MAX_EVENTS_PER_CALENDAR.to_string())
            .with_header("Prefer", format!("outlook.timezone=\"{}\"", zone.name()));

        let body = require_body(self.client.execute(request).await?)?;
        let list: GraphList<GraphEvent> = serde_json::from_value(body).map_err(MapError::from)?;

        debug!(
            count = list.value.len(),
            calendar_id = %calendar.id,
            "fetched microsoft events"
        );
        list.value
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
            mapper::event_to_native(draft),
        );
        let body = require_body(self.client.execute(request).await?)?;
        let native: GraphEvent = serde_json::from_value(body).map_err(MapError::from)?;
        mapper::parse_event(&self.account_id, &calendar.id, native).map_err(CallError::from)
    }

    async fn patch_event_impl(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<CalendarEvent, CallError> {
        let request = ApiRequest::patch(
            mapper::event_path(calendar_id, event_id),
            mapper::event_to_native(draft),
        );
        let body = require_body(self.client.execute(request).await?)?;
        let native: GraphEvent = serde_json::from_value(body).map_err(MapError::from)?;
        mapper::parse_event(&self.account_id, calendar_id, native).map_err(CallError::from)
    }

    async fn send_response_impl(
        &self,
        path: String,
        response: EventResponse,
    ) -> Result<(), CallError> {
        let request = ApiRequest::post(path, json!({ "sendResponse": response.send_update }));
        self.client.execute(request).await?;
        Ok(())
    }
}

impl<C: ApiClient> CalendarProvider for MicrosoftAdapter<C> {
    fn provider(&self) -> Provider {
        Provider::Microsoft
    }

    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>> {
        Box::pin(enveloped("microsoft.calendars", &[], self.list_calendars_impl()))
    }

    fn create_calendar(&self, draft: CalendarDraft) -> BoxFuture<'_, ProviderResult<Calendar>> {
        Box::pin(async move {
            enveloped(
                "microsoft.create_calendar",
                &[],
                self.create_calendar_impl(&draft),
            )
            .await
        })
    }

    fn update_calendar<'a>(
        &'a self,
        calendar_id: &'a str,
        draft: CalendarDraft,
    ) -> BoxFuture<'a, ProviderResult<Calendar>> {
        Box::pin(async move {
            enveloped(
                "microsoft.update_calendar",
                &[("calendar_id", calendar_id)],
                self.update_calendar_impl(calendar_id, &draft),
            )
            .await
        })
    }

    fn delete_calendar<'a>(&'a self, calendar_id: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            enveloped(
                "microsoft.delete_calendar",
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
                "microsoft.events",
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
                "microsoft.create_event",
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
        Box::pin(async move {
            let context = [
                ("calendar_id", calendar.id.as_str()),
                ("event_id", event_id),
            ];

            let event = enveloped(
                "microsoft.update_event",
                &context,
                self.patch_event_impl(&calendar.id, event_id, &draft),
            )
            .await?;

            // Graph records RSVPs through a dedicated action endpoint,
            // so a populated response needs a second, strictly
            // sequential call. The primary change stands even if this
            // step fails.
            if let Some(response) = draft.response
                && let Some(path) =
                    mapper::response_action_path(&calendar.id, event_id, response.status)
            {
                enveloped(
                    "microsoft.update_event.response",
                    &context,
                    self.send_response_impl(path, response),
                )
                .await?;
            }

            Ok(event)
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            enveloped(
                "microsoft.delete_event",
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
        let Some(path) = mapper::response_action_path(calendar_id, event_id, response.status)
        else {
            return Box::pin(async { Ok(()) });
        };

        Box::pin(async move {
            enveloped(
                "microsoft.respond_to_event",
                &[("calendar_id", calendar_id), ("event_id", event_id)],
                self.send_response_impl(path, response),
            )
            .await
        })
    }
}
