//! Provider-neutral event types.
//!
//! Providers convert their API responses into these types; the
//! aggregation engine works exclusively with them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar event (provider-neutral)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Event title; empty or missing titles render as "Untitled"
    pub summary: Option<String>,
    /// Missing boundaries are kept rather than rejected: such events
    /// measure zero minutes
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub status: EventStatus,
    pub attendees: Vec<Attendee>,
}

impl Event {
    pub fn title(&self) -> &str {
        match self.summary.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "Untitled",
        }
    }

    /// Whether the event starts without a time-of-day component.
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, Some(EventTime::Date(_)))
    }

    /// Event duration in whole minutes, ties rounded away from zero.
    ///
    /// Zero when either boundary is missing, and zero when both
    /// boundaries are date-only: all-day entries carry no timed duration.
    pub fn duration_minutes(&self) -> i64 {
        let (Some(start), Some(end)) = (&self.start, &self.end) else {
            return 0;
        };
        if start.is_date() && end.is_date() {
            return 0;
        }

        let delta = end.instant() - start.instant();
        (delta.num_milliseconds() as f64 / 60_000.0).round() as i64
    }

    /// The attendee record for the calling user, if present.
    pub fn self_attendee(&self) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.is_self)
    }
}

/// An event boundary: a timestamp with offset, or a bare date for
/// all-day entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Resolve to an instant. Date-only values resolve at midnight UTC.
    pub fn instant(&self) -> DateTime<FixedOffset> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_hms_opt(0, 0, 0).unwrap().and_utc().fixed_offset(),
        }
    }

    /// The calendar date at the value's own offset.
    pub fn local_date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.date_naive(),
            EventTime::Date(d) => *d,
        }
    }
}

/// An event attendee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    /// Whether this record belongs to the calling user
    #[serde(default)]
    pub is_self: bool,
    pub response_status: Option<ResponseStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}
