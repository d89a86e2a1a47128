use anyhow::Result;

use crate::config;
use crate::providers::google;

pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let creds = cfg.google()?.clone();

    println!("Authenticating with Google Calendar...");

    let tokens = google::authenticate(&creds).await?;
    config::save_tokens(&tokens)?;

    println!("\nAuthenticated as: {}", tokens.account);
    println!("\nRun `timetally analyze` to see where your time goes.");

    Ok(())
}
