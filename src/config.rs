//! Configuration and token storage.
//!
//! The config lives at `~/.config/timetally/config.toml` (OAuth client
//! credentials plus persisted analysis settings); tokens for the
//! authenticated account at `~/.config/timetally/tokens.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Provider configurations (OAuth credentials)
    #[serde(default)]
    pub providers: Providers,

    /// Analysis settings persisted between runs
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
pub struct Providers {
    pub google: Option<GoogleConfig>,
}

/// OAuth credentials for Google Calendar
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_exclude_all_day")]
    pub exclude_all_day: bool,

    #[serde(default = "default_min_duration")]
    pub min_duration_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            exclude_all_day: default_exclude_all_day(),
            min_duration_minutes: default_min_duration(),
        }
    }
}

fn default_exclude_all_day() -> bool {
    true
}

fn default_min_duration() -> i64 {
    1
}

impl Config {
    /// Google OAuth credentials, required for any API access.
    pub fn google(&self) -> Result<&GoogleConfig> {
        self.providers.google.as_ref().ok_or_else(|| {
            let path = config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "~/.config/timetally/config.toml".to_string());
            anyhow::anyhow!(
                "Google credentials not found in {}\n\n\
                Add your OAuth client to the config:\n\n\
                [providers.google]\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"\n\n\
                See https://console.cloud.google.com/apis/credentials for setup.",
                path
            )
        })
    }
}

/// Tokens for the authenticated account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTokens {
    /// The account's primary calendar id (its email)
    pub account: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Get the config directory path (~/.config/timetally)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("timetally");
    Ok(config_dir)
}

/// Get the config file path (~/.config/timetally/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get the tokens file path (~/.config/timetally/tokens.json)
pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

/// Load config from ~/.config/timetally/config.toml
///
/// A missing file is not an error: settings fall back to defaults and
/// credentials are only required once a command talks to the API.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Load tokens from ~/.config/timetally/tokens.json
pub fn load_tokens() -> Result<AccountTokens> {
    let path = tokens_path()?;

    if !path.exists() {
        anyhow::bail!("Not signed in. Run `timetally auth` first.");
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read tokens file at {}", path.display()))?;

    let tokens: AccountTokens = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens file at {}", path.display()))?;

    Ok(tokens)
}

/// Save tokens to ~/.config/timetally/tokens.json
pub fn save_tokens(tokens: &AccountTokens) -> Result<()> {
    let path = tokens_path()?;

    // Ensure config directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write tokens file at {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [providers.google]
            client_id = "abc.apps.googleusercontent.com"
            client_secret = "secret"

            [settings]
            exclude_all_day = false
            min_duration_minutes = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.google().unwrap().client_id, "abc.apps.googleusercontent.com");
        assert!(!config.settings.exclude_all_day);
        assert_eq!(config.settings.min_duration_minutes, 15);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.settings.exclude_all_day);
        assert_eq!(config.settings.min_duration_minutes, 1);
        assert!(config.google().is_err());
    }
}
