//! Export serializers for analysis results.
//!
//! All three take the result as an explicit value and return strings;
//! writing files is the caller's concern.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{AnalysisResult, AnalyzedEvent};
use crate::error::{TallyError, TallyResult};
use crate::event::EventTime;

/// CSV of every included event, one row per event in calendar order.
pub fn to_csv(result: &AnalysisResult) -> String {
    let mut csv =
        String::from("Calendar,Event,Date,Start Time,Duration (minutes),Duration (hours)\n");

    for calendar in &result.calendars {
        for event in &calendar.events {
            let date = event
                .local_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();

            csv.push_str(&format!(
                "{},{},{},{},{},{:.2}\n",
                quote(&calendar.name),
                quote(&event.summary),
                quote(&date),
                quote(&start_time_label(event)),
                event.duration_minutes,
                event.duration_minutes as f64 / 60.0,
            ));
        }
    }

    csv
}

/// Start-of-event label for CSV rows
fn start_time_label(event: &AnalyzedEvent) -> String {
    match &event.start {
        Some(EventTime::DateTime(dt)) => dt.format("%H:%M:%S").to_string(),
        _ => "All day".to_string(),
    }
}

/// Double-quote a CSV field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    generated_at: DateTime<Utc>,
}

/// JSON document: the full analysis result plus a generation timestamp.
pub fn to_json(result: &AnalysisResult, generated_at: DateTime<Utc>) -> TallyResult<String> {
    let export = JsonExport {
        result,
        generated_at,
    };
    serde_json::to_string_pretty(&export).map_err(|e| TallyError::Serialization(e.to_string()))
}

/// Shareable plain-text summary of an analysis.
///
/// Calendars without any measured time are left out, like the on-screen
/// breakdown.
pub fn summary_text(result: &AnalysisResult) -> String {
    let range = &result.date_range;
    let mut text = format!("Calendar Time Analysis ({} to {})\n\n", range.start, range.end);

    text.push_str(&format!("Total Time: {:.1} hours\n", result.total_hours));
    text.push_str(&format!("Active Days: {}\n", result.active_days));
    text.push_str(&format!("Average Daily: {:.1} hours\n\n", result.avg_daily_hours));

    text.push_str("Calendar Breakdown:\n");
    for calendar in result.calendars.iter().filter(|c| c.total_minutes > 0) {
        text.push_str(&format!(
            "- {}: {:.1}h ({:.1}%)\n",
            calendar.name, calendar.total_hours, calendar.percent
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, InclusionConfig};
    use crate::calendar::{Calendar, CalendarEvents};
    use crate::date_range::DateRange;
    use crate::event::{Event, EventStatus};
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    fn sample_result() -> AnalysisResult {
        let offset = FixedOffset::east_opt(0).unwrap();
        let sources = vec![CalendarEvents {
            calendar: Calendar {
                id: "work".to_string(),
                name: "Work".to_string(),
                color: "#4285f4".to_string(),
                primary: true,
            },
            events: vec![
                Event {
                    id: "e1".to_string(),
                    summary: Some("Sync \"weekly\"".to_string()),
                    start: Some(EventTime::DateTime(
                        offset.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                    )),
                    end: Some(EventTime::DateTime(
                        offset.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
                    )),
                    status: EventStatus::Confirmed,
                    attendees: vec![],
                },
                Event {
                    id: "e2".to_string(),
                    summary: Some("Offsite".to_string()),
                    start: Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())),
                    end: Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())),
                    status: EventStatus::Confirmed,
                    attendees: vec![],
                },
            ],
        }];

        let config = InclusionConfig {
            exclude_all_day: false,
            min_duration_minutes: 0,
        };
        let range = DateRange::from_args("2024-01-01", "2024-01-07").unwrap();
        aggregate(&sources, &config, &range)
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let csv = to_csv(&sample_result());
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Calendar,Event,Date,Start Time,Duration (minutes),Duration (hours)"
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"Work\",\"Sync \"\"weekly\"\"\",\"2024-01-01\",\"09:00:00\",60,1.00"
        );
        // All-day rows get a label instead of a clock time
        assert_eq!(
            lines.next().unwrap(),
            "\"Work\",\"Offsite\",\"2024-01-02\",\"All day\",0,0.00"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn json_includes_result_and_timestamp() {
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
        let json = to_json(&sample_result(), generated_at).unwrap();

        assert!(json.contains("\"generatedAt\": \"2024-01-08T12:00:00Z\""));
        assert!(json.contains("\"totalMinutes\": 60"));
        assert!(json.contains("\"activeDays\": 1"));
        assert!(json.contains("\"calendars\""));
        assert!(json.contains("\"dateRange\""));
    }

    #[test]
    fn summary_text_skips_zero_calendars() {
        let result = sample_result();
        let text = summary_text(&result);

        assert!(text.starts_with("Calendar Time Analysis (2024-01-01 to 2024-01-07)"));
        assert!(text.contains("Total Time: 1.0 hours"));
        assert!(text.contains("Active Days: 1"));
        assert!(text.contains("- Work: 1.0h (100.0%)"));

        // With nothing measured, the breakdown lists nothing
        let empty = aggregate(
            &[],
            &InclusionConfig::default(),
            &DateRange::from_args("2024-01-01", "2024-01-07").unwrap(),
        );
        let text = summary_text(&empty);
        assert!(text.contains("Total Time: 0.0 hours"));
        assert!(text.trim_end().ends_with("Calendar Breakdown:"));
    }
}
