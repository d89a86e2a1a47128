use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config;
use crate::providers::google::GoogleClient;
use crate::utils::tui::spinner;

pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let creds = cfg.google()?.clone();
    let tokens = config::load_tokens()?;

    let mut client = GoogleClient::new(creds, tokens).await?;

    let progress = spinner("Fetching calendars");
    let calendars = client.fetch_calendars().await?;
    progress.finish_and_clear();

    if client.tokens_changed() {
        config::save_tokens(client.tokens())?;
    }

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for calendar in &calendars {
        let marker = if calendar.primary { " (primary)" } else { "" };
        println!("{}{}  {}", calendar.name, marker.dimmed(), calendar.id.dimmed());
    }

    Ok(())
}
