use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use timetally_core::{aggregate, export, CalendarEvents, DateRange, InclusionConfig};

use crate::config;
use crate::providers::google::GoogleClient;
use crate::render;
use crate::utils::tui::spinner;

pub struct Options {
    pub include_all_day: bool,
    pub min_duration: Option<i64>,
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub summary: bool,
}

pub async fn run(range: DateRange, opts: Options) -> Result<()> {
    let cfg = config::load_config()?;
    let creds = cfg.google()?.clone();
    let tokens = config::load_tokens()?;

    // Flags override the persisted settings for this run only
    let inclusion = InclusionConfig {
        exclude_all_day: !opts.include_all_day && cfg.settings.exclude_all_day,
        min_duration_minutes: opts.min_duration.unwrap_or(cfg.settings.min_duration_minutes),
    };

    let mut client = GoogleClient::new(creds, tokens).await?;

    let progress = spinner("Fetching calendars");
    let calendars = client.fetch_calendars().await?;
    progress.finish_and_clear();

    let mut sources = Vec::new();

    for calendar in calendars {
        let progress = spinner(format!("Fetching events from {}", calendar.name));
        match client.fetch_events(&calendar.id, &range).await {
            Ok(events) => {
                progress.finish_and_clear();
                sources.push(CalendarEvents { calendar, events });
            }
            Err(err) => {
                // One unreadable calendar should not sink the analysis
                progress.finish_and_clear();
                eprintln!("{}", format!("Skipping {}: {:#}", calendar.name, err).yellow());
            }
        }
    }

    if client.tokens_changed() {
        config::save_tokens(client.tokens())?;
    }

    let result = aggregate(&sources, &inclusion, &range);

    if opts.summary {
        print!("{}", export::summary_text(&result));
    } else {
        render::print_analysis(&result);
    }

    if let Some(path) = &opts.csv {
        std::fs::write(path, export::to_csv(&result))
            .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
        println!("\nWrote CSV to {}", path.display());
    }

    if let Some(path) = &opts.json {
        let json = export::to_json(&result, Utc::now())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
        println!("\nWrote JSON to {}", path.display());
    }

    Ok(())
}
