//! Provider adapters for the calbridge canonical calendar model.
//!
//! This crate is the boundary between the canonical model and the
//! calendar backends:
//!
//! - [`CalendarProvider`] - the uniform contract every backend implements
//! - [`MicrosoftAdapter`] / [`GoogleAdapter`] - the two backends
//! - [`ApiClient`] - the verb-based HTTP port adapters talk through
//! - [`ProviderError`] - the only error type crossing the boundary
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐
//! │ Microsoft Graph  │    │ Google Calendar  │
//! └────────┬─────────┘    └────────┬─────────┘
//!          │ ApiClient             │ ApiClient
//!          ▼                       ▼
//! ┌──────────────────┐    ┌──────────────────┐
//! │ MicrosoftAdapter │    │  GoogleAdapter   │
//! │    + mapper      │    │    + mapper      │
//! └────────┬─────────┘    └────────┬─────────┘
//!          │    CalendarProvider   │
//!          └──────────┬────────────┘
//!                     ▼
//!         canonical Calendar / CalendarEvent
//!              or ProviderError
//! ```
//!
//! Each adapter owns one authenticated client for one account,
//! captured at construction. Mappers are pure; every network-facing
//! operation is wrapped once by the error envelope in [`error`].
//!
//! # Example
//!
//! ```ignore
//! use calbridge_providers::{CalendarProvider, MicrosoftAdapter};
//!
//! let adapter = MicrosoftAdapter::new(access_token, "user@example.com")?;
//! for calendar in adapter.calendars().await? {
//!     println!("{} ({})", calendar.name, calendar.color);
//! }
//! ```

pub mod error;
pub mod google;
pub mod http;
pub mod microsoft;
pub mod provider;

pub use error::{ApiError, CallError, MapError, ProviderError, ProviderResult};
pub use google::GoogleAdapter;
pub use http::{ApiClient, ApiRequest, BearerClient, Method};
pub use microsoft::MicrosoftAdapter;
pub use provider::{BoxFuture, CalendarProvider, MAX_EVENTS_PER_CALENDAR};
