//! The event aggregation engine.
//!
//! One pure pass over raw per-calendar event batches: filter through the
//! inclusion rules, annotate survivors with computed durations, fold into
//! per-calendar and per-day aggregates, then derive grand totals and
//! percentages. The same engine feeds the breakdown table, the bar
//! chart, the daily timeline, and the export serializers.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvents;
use crate::date_range::DateRange;
use crate::event::{Event, EventTime, ResponseStatus};

/// Rules deciding which raw events contribute to aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionConfig {
    /// Drop events whose start has no time-of-day component
    pub exclude_all_day: bool,
    /// Drop events strictly shorter than this many minutes
    pub min_duration_minutes: i64,
}

impl Default for InclusionConfig {
    fn default() -> Self {
        InclusionConfig {
            exclude_all_day: true,
            min_duration_minutes: 1,
        }
    }
}

/// Whether an event contributes to aggregates.
///
/// Three independent predicates, ANDed: the all-day rule, the minimum
/// duration rule, and the declined-by-self rule. All-day events measure
/// zero minutes, so with `min_duration_minutes <= 0` they survive the
/// duration rule and only `exclude_all_day` removes them.
pub fn should_include(event: &Event, config: &InclusionConfig) -> bool {
    if config.exclude_all_day && event.is_all_day() {
        return false;
    }

    if event.duration_minutes() < config.min_duration_minutes {
        return false;
    }

    if let Some(me) = event.self_attendee() {
        if me.response_status == Some(ResponseStatus::Declined) {
            return false;
        }
    }

    true
}

/// An included event annotated with its measured duration and owning
/// calendar, ready for display and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedEvent {
    /// Resolved title ("Untitled" when the source had none)
    pub summary: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub duration_minutes: i64,
    pub calendar_id: String,
    pub calendar_name: String,
    pub calendar_color: String,
}

impl AnalyzedEvent {
    /// The calendar date of the event's start, at its own offset.
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.start.as_ref().map(EventTime::local_date)
    }

    pub fn start_instant(&self) -> Option<DateTime<FixedOffset>> {
        self.start.as_ref().map(EventTime::instant)
    }
}

/// Time spent in one calendar over the analyzed range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarAggregate {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Included events, ascending by start
    pub events: Vec<AnalyzedEvent>,
    pub total_minutes: i64,
    pub total_hours: f64,
    /// Share of the grand total, 0.0 when the grand total is zero
    pub percent: f64,
}

/// Time spent on one calendar date, across calendars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// Included events, ascending by start
    pub events: Vec<AnalyzedEvent>,
    pub total_minutes: i64,
}

/// The full result of one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_minutes: i64,
    pub total_hours: f64,
    /// Count of distinct dates with nonzero aggregated duration
    pub active_days: usize,
    /// 0.0 when there are no active days
    pub avg_daily_hours: f64,
    /// Descending by total minutes; ties keep input calendar order
    pub calendars: Vec<CalendarAggregate>,
    /// Keyed by date, iterated in date order
    pub days: BTreeMap<NaiveDate, DailyAggregate>,
    pub date_range: DateRange,
}

impl AnalysisResult {
    pub fn calendar(&self, id: &str) -> Option<&CalendarAggregate> {
        self.calendars.iter().find(|c| c.id == id)
    }
}

/// Aggregate raw per-calendar event batches into an [`AnalysisResult`].
///
/// Pure function of its inputs; the result is recomputed from scratch on
/// every call and never fails. Empty input produces an all-zero result.
pub fn aggregate(
    sources: &[CalendarEvents],
    config: &InclusionConfig,
    range: &DateRange,
) -> AnalysisResult {
    let mut calendars: Vec<CalendarAggregate> = Vec::new();

    for source in sources {
        let mut events: Vec<AnalyzedEvent> = source
            .events
            .iter()
            .filter(|event| should_include(event, config))
            .map(|event| AnalyzedEvent {
                summary: event.title().to_string(),
                start: event.start.clone(),
                end: event.end.clone(),
                duration_minutes: event.duration_minutes(),
                calendar_id: source.calendar.id.clone(),
                calendar_name: source.calendar.name.clone(),
                calendar_color: source.calendar.color.clone(),
            })
            .collect();

        // Calendars with no included events do not appear at all; a
        // calendar whose included events all measure zero still does
        if events.is_empty() {
            continue;
        }

        events.sort_by_key(|e| e.start_instant());

        let total_minutes: i64 = events.iter().map(|e| e.duration_minutes).sum();

        calendars.push(CalendarAggregate {
            id: source.calendar.id.clone(),
            name: source.calendar.name.clone(),
            color: source.calendar.color.clone(),
            events,
            total_minutes,
            total_hours: total_minutes as f64 / 60.0,
            percent: 0.0,
        });
    }

    let total_minutes: i64 = calendars.iter().map(|c| c.total_minutes).sum();

    for calendar in &mut calendars {
        // Explicit zero branch: an empty range must not divide by zero
        calendar.percent = if total_minutes > 0 {
            calendar.total_minutes as f64 / total_minutes as f64 * 100.0
        } else {
            0.0
        };
    }

    // Group across calendars by the date portion of each event's local
    // start, while `calendars` is still in input order
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    for calendar in &calendars {
        for event in &calendar.events {
            let Some(date) = event.local_date() else {
                continue;
            };
            days.entry(date)
                .or_insert_with(|| DailyAggregate {
                    date,
                    events: Vec::new(),
                    total_minutes: 0,
                })
                .events
                .push(event.clone());
        }
    }

    for day in days.values_mut() {
        day.events.sort_by_key(|e| e.start_instant());
        day.total_minutes = day.events.iter().map(|e| e.duration_minutes).sum();
    }
    days.retain(|_, day| day.total_minutes != 0);

    // Descending by time; the sort is stable, so ties keep input order
    calendars.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));

    let active_days = days.len();
    let total_hours = total_minutes as f64 / 60.0;
    let avg_daily_hours = if active_days > 0 {
        total_hours / active_days as f64
    } else {
        0.0
    };

    AnalysisResult {
        total_minutes,
        total_hours,
        active_days,
        avg_daily_hours,
        calendars,
        days,
        date_range: range.clone(),
    }
}
