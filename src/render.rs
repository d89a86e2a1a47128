//! Terminal rendering for analysis results.
//!
//! Four sections: summary stats, per-calendar breakdown, a horizontal
//! bar chart of the biggest calendars, and a per-day timeline. Calendar
//! colors come through as truecolor from the hex values Google reports.

use owo_colors::OwoColorize;
use timetally_core::{AnalysisResult, AnalyzedEvent, CalendarAggregate, EventTime};

/// Calendars shown in the bar chart
const CHART_LIMIT: usize = 8;
/// Character width of a full-scale chart bar
const CHART_WIDTH: usize = 30;
/// Longest calendar label in the chart before truncation
const LABEL_WIDTH: usize = 15;

const DEFAULT_RGB: (u8, u8, u8) = (0x42, 0x85, 0xf4);

pub fn print_analysis(result: &AnalysisResult) {
    print_summary(result);
    print_breakdown(result);
    print_chart(result);
    print_timeline(result);
}

fn print_summary(result: &AnalysisResult) {
    let range = &result.date_range;
    println!(
        "{}",
        format!("Calendar time {} to {}", range.start, range.end).bold()
    );
    println!();
    println!(
        "  {} total    {} active {}    {} avg/day",
        format!("{:.1}h", result.total_hours).bold(),
        result.active_days,
        pluralize("day", "days", result.active_days),
        format!("{:.1}h", result.avg_daily_hours).bold(),
    );
}

fn print_breakdown(result: &AnalysisResult) {
    let visible: Vec<&CalendarAggregate> = result
        .calendars
        .iter()
        .filter(|c| c.total_minutes > 0)
        .collect();

    if visible.is_empty() {
        println!();
        println!("{}", "No timed events in this range".dimmed());
        return;
    }

    println!();
    for calendar in &visible {
        let (r, g, b) = hex_rgb(&calendar.color);
        let stats = format!(
            "{} {} • {:.1}%",
            calendar.events.len(),
            pluralize("event", "events", calendar.events.len()),
            calendar.percent
        );
        println!(
            "  {} {:<24} {} {}",
            "●".truecolor(r, g, b),
            calendar.name,
            format!("{:>6.1}h", calendar.total_hours).bold(),
            stats.dimmed()
        );
    }
}

fn print_chart(result: &AnalysisResult) {
    let top: Vec<&CalendarAggregate> = result
        .calendars
        .iter()
        .filter(|c| c.total_minutes > 0)
        .take(CHART_LIMIT)
        .collect();

    if top.is_empty() {
        return;
    }

    println!();
    for calendar in &top {
        let (r, g, b) = hex_rgb(&calendar.color);
        let bar = "█".repeat(bar_width(calendar.percent));
        println!(
            "  {:<width$} {} {}",
            truncate(&calendar.name, LABEL_WIDTH),
            bar.truecolor(r, g, b),
            format!("{:.1}%", calendar.percent).dimmed(),
            width = LABEL_WIDTH,
        );
    }
}

fn print_timeline(result: &AnalysisResult) {
    for day in result.days.values() {
        println!();
        println!(
            "{}  {}",
            day.date.format("%a %b %-d").to_string().bold(),
            format!("{:.1}h", day.total_minutes as f64 / 60.0).dimmed()
        );

        for event in &day.events {
            let (r, g, b) = hex_rgb(&event.calendar_color);
            println!(
                "  {} {} {} {}",
                "▏".truecolor(r, g, b),
                start_label(event),
                event.summary,
                format!("({}m)", event.duration_minutes).dimmed()
            );
        }
    }
}

/// "HH:MM" for timed events, "all-day" otherwise
fn start_label(event: &AnalyzedEvent) -> String {
    match &event.start {
        Some(EventTime::DateTime(dt)) => format!("{:>7}", dt.format("%H:%M")),
        _ => format!("{:>7}", "all-day"),
    }
}

/// Bar length proportional to the calendar's share; any calendar in the
/// chart gets at least one cell.
fn bar_width(percent: f64) -> usize {
    let width = (percent / 100.0 * CHART_WIDTH as f64).round() as usize;
    width.clamp(1, CHART_WIDTH)
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let head: String = name.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Parse a "#rrggbb" color, falling back to the Google default blue.
fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return DEFAULT_RGB;
    }

    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => (r, g, b),
        _ => DEFAULT_RGB,
    }
}

fn pluralize<'a>(singular: &'a str, plural: &'a str, count: usize) -> &'a str {
    if count == 1 { singular } else { plural }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(hex_rgb("#4285f4"), (0x42, 0x85, 0xf4));
        assert_eq!(hex_rgb("9fe1e7"), (0x9f, 0xe1, 0xe7));
        // Google's numeric colorId values fall back to the default
        assert_eq!(hex_rgb("4"), DEFAULT_RGB);
        assert_eq!(hex_rgb("#zzzzzz"), DEFAULT_RGB);
        assert_eq!(hex_rgb(""), DEFAULT_RGB);
    }

    #[test]
    fn bar_width_scales_and_clamps() {
        assert_eq!(bar_width(100.0), CHART_WIDTH);
        assert_eq!(bar_width(50.0), CHART_WIDTH / 2);
        // Tiny but nonzero shares still paint one cell
        assert_eq!(bar_width(0.1), 1);
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate("Work", 15), "Work");
        assert_eq!(truncate("A very long calendar name", 15), "A very long ...");
        assert_eq!(truncate("A very long calendar name", 15).chars().count(), 15);
    }
}
