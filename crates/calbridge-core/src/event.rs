//! Canonical event types.
//!
//! [`CalendarEvent`] is the normalized representation every adapter
//! converges on; [`EventDraft`] is the validated input shape for create
//! and update operations. Provider data that has no canonical field is
//! preserved verbatim in `provider_data`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::Provider;
use crate::time::EventTime;

/// A meeting-invitation response state.
///
/// `Unknown` is the sentinel for "no action requested": any operation
/// that would submit an RSVP must treat it as a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The invitation has been accepted.
    Accepted,
    /// The invitation has been declined.
    Declined,
    /// The invitation has been tentatively accepted.
    Tentative,
    /// No response recorded, or none requested.
    #[default]
    Unknown,
}

impl ResponseStatus {
    /// Returns `true` if submitting this status to a provider is meaningful.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns the canonical wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::Unknown => "unknown",
        }
    }
}

/// An attendee of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// The attendee's email address.
    pub email: String,
    /// The attendee's display name, if available.
    pub display_name: Option<String>,
    /// Whether attendance is optional.
    pub optional: bool,
    /// Whether this attendee organized the event.
    pub organizer: bool,
    /// The attendee's response state.
    pub response_status: ResponseStatus,
}

impl Attendee {
    /// Creates an attendee with the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            optional: false,
            organizer: false,
            response_status: ResponseStatus::Unknown,
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Builder method to mark attendance as optional.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Builder method to mark as the organizer.
    pub fn with_organizer(mut self, organizer: bool) -> Self {
        self.organizer = organizer;
        self
    }

    /// Builder method to set the response state.
    pub fn with_response_status(mut self, status: ResponseStatus) -> Self {
        self.response_status = status;
        self
    }
}

/// A canonical calendar event.
///
/// Invariants upheld by the mappers that produce these:
/// - `start <= end`
/// - times are always explicit [`EventTime`] values, never bare local times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider-native event identifier.
    pub id: String,
    /// The calendar this event belongs to.
    pub calendar_id: String,
    /// The account the event was fetched through.
    pub account_id: String,
    /// Which backend the event lives in.
    pub provider: Provider,
    /// The event title.
    pub title: String,
    /// The event description, if any.
    pub description: Option<String>,
    /// The event location, if any.
    pub location: Option<String>,
    /// When the event starts.
    pub start: EventTime,
    /// When the event ends.
    pub end: EventTime,
    /// The event attendees.
    pub attendees: Vec<Attendee>,
    /// The authenticated account's own response state.
    pub response_status: ResponseStatus,
    /// Whether this event is part of a recurring series.
    pub is_recurring: bool,
    /// The id of the recurring series this instance belongs to.
    pub recurring_event_id: Option<String>,
    /// Provider fields with no canonical counterpart, passed through verbatim.
    #[serde(default)]
    pub provider_data: BTreeMap<String, serde_json::Value>,
}

impl CalendarEvent {
    /// Creates an event with the required identity and time fields.
    pub fn new(
        provider: Provider,
        account_id: impl Into<String>,
        calendar_id: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
        start: EventTime,
        end: EventTime,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            account_id: account_id.into(),
            provider,
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            attendees: Vec::new(),
            response_status: ResponseStatus::Unknown,
            is_recurring: false,
            recurring_event_id: None,
            provider_data: BTreeMap::new(),
        }
    }

    /// Returns `true` if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

/// Error produced when an input shape fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    /// The draft's start time is after its end time.
    #[error("event starts at {start} but ends earlier at {end}")]
    StartAfterEnd {
        /// The offending start time.
        start: EventTime,
        /// The offending end time.
        end: EventTime,
    },
}

/// A requested meeting-invitation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    /// The response to record.
    pub status: ResponseStatus,
    /// Whether the organizer should be notified.
    pub send_update: bool,
}

impl EventResponse {
    /// Creates a response with notifications disabled.
    pub fn new(status: ResponseStatus) -> Self {
        Self {
            status,
            send_update: false,
        }
    }

    /// Builder method to control organizer notification.
    pub fn with_send_update(mut self, send_update: bool) -> Self {
        self.send_update = send_update;
        self
    }
}

/// Canonical payload for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// The event title.
    pub title: String,
    /// The event description, if any.
    pub description: Option<String>,
    /// The event location, if any.
    pub location: Option<String>,
    /// When the event starts.
    pub start: EventTime,
    /// When the event ends.
    pub end: EventTime,
    /// The event attendees.
    pub attendees: Vec<Attendee>,
    /// An RSVP to record alongside the mutation, if any.
    pub response: Option<EventResponse>,
}

impl EventDraft {
    /// Creates a draft, rejecting an inverted time interval.
    pub fn new(
        title: impl Into<String>,
        start: EventTime,
        end: EventTime,
    ) -> Result<Self, DraftError> {
        if start > end {
            return Err(DraftError::StartAfterEnd { start, end });
        }
        Ok(Self {
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            attendees: Vec::new(),
            response: None,
        })
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, attendee: Attendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    /// Builder method to attach an RSVP.
    pub fn with_response(mut self, response: EventResponse) -> Self {
        self.response = Some(response);
        self
    }
}
