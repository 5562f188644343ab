//! Time types for canonical calendar events.
//!
//! Every event time is either a [`EventTime::Zoned`] instant (a UTC
//! instant paired with the IANA zone it should be presented in) or an
//! [`EventTime::AllDay`] date. There is no variant for a bare local
//! time: anything a provider returns is resolved to an instant before
//! it enters the canonical model.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The time of a canonical calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventTime {
    /// A specific instant, carrying the zone it was expressed in.
    Zoned {
        /// The instant in UTC.
        utc: DateTime<Utc>,
        /// The IANA zone the instant should be displayed in.
        zone: Tz,
    },
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a zoned event time from a UTC instant and a display zone.
    pub fn zoned(utc: DateTime<Utc>, zone: Tz) -> Self {
        Self::Zoned { utc, zone }
    }

    /// Creates an event time from a UTC instant, displayed in UTC.
    pub fn from_utc(utc: DateTime<Utc>) -> Self {
        Self::Zoned { utc, zone: Tz::UTC }
    }

    /// Creates an all-day event time.
    pub fn all_day(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Resolves a provider-supplied wall-clock time in `zone` to an instant.
    ///
    /// Ambiguous local times (DST fold) resolve to the earliest valid
    /// instant; nonexistent local times (DST gap) yield `None`.
    pub fn from_local(local: NaiveDateTime, zone: Tz) -> Option<Self> {
        let resolved = zone.from_local_datetime(&local).earliest()?;
        Some(Self::Zoned {
            utc: resolved.with_timezone(&Utc),
            zone,
        })
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the display zone, if this is a zoned time.
    pub fn zone(&self) -> Option<Tz> {
        match self {
            Self::Zoned { zone, .. } => Some(*zone),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the instant rendered in its display zone, if zoned.
    pub fn as_zoned(&self) -> Option<DateTime<Tz>> {
        match self {
            Self::Zoned { utc, zone } => Some(utc.with_timezone(zone)),
            Self::AllDay(_) => None,
        }
    }

    /// Converts to a UTC instant for comparison purposes.
    ///
    /// All-day events compare at midnight UTC on their date.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Zoned { utc, .. } => *utc,
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the date portion of this event time, in its display zone.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Zoned { utc, zone } => utc.with_timezone(zone).date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc().cmp(&other.to_utc())
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zoned { utc, zone } => write!(
                f,
                "{}",
                utc.with_timezone(zone)
                    .to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            Self::AllDay(date) => write!(f, "{date}"),
        }
    }
}

/// A UTC time window for querying calendar events.
///
/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window, converting both bounds to UTC.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new<Z: TimeZone>(start: DateTime<Z>, end: DateTime<Z>) -> Self {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window from a start instant and a duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within this window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}
