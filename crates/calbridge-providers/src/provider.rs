//! CalendarProvider trait definition.
//!
//! The uniform contract every backend adapter implements, and the only
//! public surface callers see: canonical types in, canonical types (or
//! a [`ProviderError`]) out. Provider-native shapes never cross this
//! boundary.

use std::future::Future;
use std::pin::Pin;

use chrono_tz::Tz;

use calbridge_core::{
    Calendar, CalendarDraft, CalendarEvent, EventDraft, EventResponse, Provider, TimeWindow,
};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Async functions in traits do not yet mix with dynamic dispatch;
/// boxed futures keep the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Maximum number of events fetched per calendar in one listing call.
///
/// Bounds response size and per-call latency; callers needing more
/// issue narrower time windows.
pub const MAX_EVENTS_PER_CALENDAR: usize = 250;

/// The uniform contract for calendar backends.
///
/// One adapter instance is scoped to a single account's credentials,
/// captured at construction. All operations are independent units of
/// asynchronous work: they may run concurrently on the same instance,
/// share no mutable state, and perform no retries — every failure is
/// surfaced as a [`crate::ProviderError`] exactly once.
pub trait CalendarProvider: Send + Sync {
    /// Returns which backend this adapter talks to.
    fn provider(&self) -> Provider;

    /// Returns the account this adapter is scoped to.
    fn account_id(&self) -> &str;

    /// Lists the account's calendars.
    ///
    /// Every returned calendar has a populated color: the provider's
    /// native one, or a palette color assigned by listing position.
    fn calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>>;

    /// Creates a calendar.
    fn create_calendar(&self, draft: CalendarDraft) -> BoxFuture<'_, ProviderResult<Calendar>>;

    /// Updates a calendar.
    fn update_calendar<'a>(
        &'a self,
        calendar_id: &'a str,
        draft: CalendarDraft,
    ) -> BoxFuture<'a, ProviderResult<Calendar>>;

    /// Deletes a calendar.
    fn delete_calendar<'a>(&'a self, calendar_id: &'a str) -> BoxFuture<'a, ProviderResult<()>>;

    /// Lists events in `calendar` within `window`, presented in `zone`.
    ///
    /// Results are ordered ascending by start time and capped at
    /// [`MAX_EVENTS_PER_CALENDAR`].
    fn events<'a>(
        &'a self,
        calendar: &'a Calendar,
        window: TimeWindow,
        zone: Tz,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Creates an event in `calendar`.
    fn create_event<'a>(
        &'a self,
        calendar: &'a Calendar,
        draft: EventDraft,
    ) -> BoxFuture<'a, ProviderResult<CalendarEvent>>;

    /// Updates an event in `calendar`.
    ///
    /// A populated, actionable response in the draft is also recorded
    /// with the provider, after — and only after — the primary update
    /// succeeds.
    fn update_event<'a>(
        &'a self,
        calendar: &'a Calendar,
        event_id: &'a str,
        draft: EventDraft,
    ) -> BoxFuture<'a, ProviderResult<CalendarEvent>>;

    /// Deletes an event.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Records a meeting-invitation response.
    ///
    /// A response with status [`ResponseStatus::Unknown`] means no
    /// action was requested: the call resolves immediately without any
    /// network traffic.
    ///
    /// [`ResponseStatus::Unknown`]: calbridge_core::ResponseStatus::Unknown
    fn respond_to_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        response: EventResponse,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
