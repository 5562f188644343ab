//! Microsoft 365 calendar adapter.
//!
//! Implements the [`CalendarProvider`] contract against the Microsoft
//! Graph API.
//!
//! # Provider notes
//!
//! - Calendar listings must carry an explicit `$select` field list:
//!   Graph omits `hexColor` and the permission flags otherwise.
//! - Event times arrive as a wall-clock `dateTime` plus a `timeZone`
//!   name; the mapper resolves the pair into one unambiguous instant.
//! - RSVPs go through dedicated action endpoints (`accept`, `decline`,
//!   `tentativelyAccept`), so an update that also records a response
//!   issues a second, strictly sequential call.
//!
//! [`CalendarProvider`]: crate::provider::CalendarProvider

mod adapter;
pub(crate) mod mapper;

pub use adapter::{GRAPH_BASE_URL, MicrosoftAdapter};
