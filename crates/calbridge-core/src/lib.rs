//! Canonical calendar model: calendars, events, time, colors

pub mod calendar;
pub mod color;
pub mod event;
pub mod time;
pub mod tracing;

pub use calendar::{Calendar, CalendarDraft, CalendarPermissions, Provider};
pub use color::fallback_color;
pub use event::{
    Attendee, CalendarEvent, DraftError, EventDraft, EventResponse, ResponseStatus,
};
pub use time::{EventTime, TimeWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
