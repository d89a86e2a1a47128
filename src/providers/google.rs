//! Google Calendar API access: OAuth flow, calendar list, event fetch.
//!
//! Talks to the REST API directly with bearer tokens. The access token
//! is refreshed up front when its stored expiry has passed; if the API
//! still answers 401, the request is retried exactly once after another
//! refresh, then the failure is surfaced.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use timetally_core::{Attendee, Calendar, DateRange, Event, EventStatus, EventTime, ResponseStatus};

use crate::config::{AccountTokens, GoogleConfig};

const SCOPES: &str = "https://www.googleapis.com/auth/calendar.readonly";

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const REDIRECT_PORT: u16 = 8085;

fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

/// Run the full OAuth authentication flow.
pub async fn authenticate(config: &GoogleConfig) -> Result<AccountTokens> {
    let state = uuid::Uuid::new_v4().to_string();
    let redirect = redirect_uri();

    let mut auth_url = Url::parse(AUTH_URL)?;
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &redirect)
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPES)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", &state);

    println!("\nOpen this URL in your browser to authenticate:\n");
    println!("{}\n", auth_url);

    // Try to open the browser automatically
    if open::that(auth_url.as_str()).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, callback_state) = wait_for_callback().await?;

    if callback_state != state {
        anyhow::bail!("OAuth state mismatch, aborting");
    }

    println!("\nReceived authorization code, exchanging for tokens...");

    let response: TokenResponse = reqwest::Client::new()
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect.as_str()),
        ])
        .send()
        .await
        .context("Failed to exchange code for tokens")?
        .error_for_status()
        .context("Token exchange rejected")?
        .json()
        .await
        .context("Failed to parse token response")?;

    let account = primary_calendar_id(&response.access_token).await?;

    Ok(AccountTokens {
        account,
        expires_at: expiry(response.expires_in),
        access_token: response.access_token,
        refresh_token: response.refresh_token,
    })
}

/// Refresh an expired access token.
pub async fn refresh_token(config: &GoogleConfig, tokens: &AccountTokens) -> Result<AccountTokens> {
    let response: TokenResponse = reqwest::Client::new()
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("refresh_token", tokens.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .context("Failed to refresh token")?
        .error_for_status()
        .context("Token refresh rejected")?
        .json()
        .await
        .context("Failed to parse token response")?;

    // Google typically doesn't return a new refresh_token on refresh,
    // so preserve the original one when the response omits it
    let refresh_token = if response.refresh_token.is_empty() {
        tokens.refresh_token.clone()
    } else {
        response.refresh_token
    };

    Ok(AccountTokens {
        account: tokens.account.clone(),
        expires_at: expiry(response.expires_in),
        access_token: response.access_token,
        refresh_token,
    })
}

/// Whether the stored access token is expired or about to expire.
pub fn needs_refresh(tokens: &AccountTokens) -> bool {
    match tokens.expires_at {
        Some(expires_at) => expires_at <= Utc::now() + chrono::Duration::seconds(60),
        None => false,
    }
}

fn expiry(expires_in: i64) -> Option<DateTime<Utc>> {
    if expires_in > 0 {
        Some(Utc::now() + chrono::Duration::seconds(expires_in))
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
}

/// An authenticated Google Calendar API client.
pub struct GoogleClient {
    http: reqwest::Client,
    config: GoogleConfig,
    tokens: AccountTokens,
    refreshed: bool,
}

impl GoogleClient {
    pub async fn new(config: GoogleConfig, tokens: AccountTokens) -> Result<Self> {
        let mut client = GoogleClient {
            http: reqwest::Client::new(),
            config,
            tokens,
            refreshed: false,
        };

        if needs_refresh(&client.tokens) {
            client.refresh().await?;
        }

        Ok(client)
    }

    /// Tokens as currently held, for persisting after a refresh.
    pub fn tokens(&self) -> &AccountTokens {
        &self.tokens
    }

    /// Whether the client refreshed its tokens since construction.
    pub fn tokens_changed(&self) -> bool {
        self.refreshed
    }

    async fn refresh(&mut self) -> Result<()> {
        self.tokens = refresh_token(&self.config, &self.tokens).await?;
        self.refreshed = true;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&mut self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.tokens.access_token)
            .send()
            .await?;

        // One refresh-and-retry on an expired token, then give up
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh().await?;
            self.http
                .get(url)
                .bearer_auth(&self.tokens.access_token)
                .send()
                .await?
        } else {
            response
        };

        Ok(response.error_for_status()?.json().await?)
    }

    /// Fetch the account's calendar list, skipping calendars the user
    /// has deselected in the Google UI.
    pub async fn fetch_calendars(&mut self) -> Result<Vec<Calendar>> {
        let url = Url::parse(&format!("{}/users/me/calendarList", API_BASE))?;

        let response: CalendarListResponse =
            self.get_json(url).await.context("Failed to load calendars")?;

        Ok(response.into_calendars())
    }

    /// Fetch one calendar's events over the range, recurring events
    /// expanded into single instances.
    pub async fn fetch_events(&mut self, calendar_id: &str, range: &DateRange) -> Result<Vec<Event>> {
        let mut url = Url::parse(API_BASE)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid API base URL"))?
            .extend(["calendars", calendar_id, "events"]);
        url.query_pairs_mut()
            .append_pair("timeMin", &range.time_min())
            .append_pair("timeMax", &range.time_max())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("maxResults", "2500");

        let response: EventListResponse = self
            .get_json(url)
            .await
            .with_context(|| format!("Failed to fetch events from calendar {}", calendar_id))?;

        Ok(response.into_events())
    }
}

/// The authenticated user's primary calendar id (their email).
async fn primary_calendar_id(access_token: &str) -> Result<String> {
    let url = Url::parse(&format!("{}/users/me/calendarList", API_BASE))?;

    let response: CalendarListResponse = reqwest::Client::new()
        .get(url)
        .bearer_auth(access_token)
        .send()
        .await
        .context("Failed to load calendars")?
        .error_for_status()
        .context("Calendar list rejected")?
        .json()
        .await
        .context("Failed to parse calendar list")?;

    Ok(response
        .items
        .into_iter()
        .find(|c| c.primary && !c.id.is_empty())
        .map(|c| c.id)
        .unwrap_or_else(|| "(unknown account)".to_string()))
}

/// Start a local HTTP server to receive the OAuth callback.
/// Returns (code, state).
async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(("127.0.0.1", REDIRECT_PORT))
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    // Request line looks like: GET /callback?code=xxx&state=yyy HTTP/1.1
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = Url::parse(&format!("http://localhost{}", url_part))?;

    let code =
        query_param(&url, "code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state =
        query_param(&url, "state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    // Send a response to the browser
    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok((code, state))
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.to_string())
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEntry>,
}

impl CalendarListResponse {
    fn into_calendars(self) -> Vec<Calendar> {
        self.items
            .into_iter()
            .filter(|c| !c.id.is_empty() && c.selected.unwrap_or(true))
            .map(GoogleCalendarEntry::into_calendar)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "backgroundColor")]
    background_color: Option<String>,
    #[serde(rename = "colorId")]
    color_id: Option<String>,
    #[serde(default)]
    primary: bool,
    selected: Option<bool>,
}

impl GoogleCalendarEntry {
    fn into_calendar(self) -> Calendar {
        let color = self
            .background_color
            .or(self.color_id)
            .unwrap_or_else(|| "#4285f4".to_string());

        Calendar {
            id: self.id,
            name: if self.summary.is_empty() {
                "(unnamed)".to_string()
            } else {
                self.summary
            },
            color,
            primary: self.primary,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

impl EventListResponse {
    fn into_events(self) -> Vec<Event> {
        self.items
            .into_iter()
            .filter(|e| !e.id.is_empty())
            .map(GoogleEvent::into_event)
            .filter(|e| e.status != EventStatus::Cancelled)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    #[serde(default)]
    id: String,
    summary: Option<String>,
    status: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
}

impl GoogleEvent {
    fn into_event(self) -> Event {
        let status = match self.status.as_deref() {
            Some("tentative") => EventStatus::Tentative,
            Some("cancelled") => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        let attendees = self
            .attendees
            .into_iter()
            .map(|a| Attendee {
                email: a.email,
                is_self: a.self_,
                response_status: a.response_status.as_deref().and_then(parse_response_status),
            })
            .collect();

        Event {
            id: self.id,
            summary: self.summary,
            start: self.start.and_then(GoogleEventTime::into_event_time),
            end: self.end.and_then(GoogleEventTime::into_event_time),
            status,
            attendees,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEventTime {
    date: Option<NaiveDate>,
    #[serde(rename = "dateTime")]
    date_time: Option<DateTime<FixedOffset>>,
}

impl GoogleEventTime {
    fn into_event_time(self) -> Option<EventTime> {
        if let Some(dt) = self.date_time {
            Some(EventTime::DateTime(dt))
        } else {
            self.date.map(EventTime::Date)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleAttendee {
    #[serde(default)]
    email: String,
    #[serde(default, rename = "self")]
    self_: bool,
    #[serde(rename = "responseStatus")]
    response_status: Option<String>,
}

fn parse_response_status(s: &str) -> Option<ResponseStatus> {
    match s {
        "accepted" => Some(ResponseStatus::Accepted),
        "declined" => Some(ResponseStatus::Declined),
        "tentative" => Some(ResponseStatus::Tentative),
        "needsAction" => Some(ResponseStatus::NeedsAction),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_list_payload() {
        let payload = r#"{
            "items": [
                {
                    "id": "evt1",
                    "status": "confirmed",
                    "summary": "Planning",
                    "start": { "dateTime": "2024-01-01T09:00:00-05:00" },
                    "end": { "dateTime": "2024-01-01T10:30:00-05:00" },
                    "attendees": [
                        { "email": "me@example.com", "self": true, "responseStatus": "accepted" },
                        { "email": "other@example.com", "responseStatus": "declined" }
                    ]
                },
                {
                    "id": "evt2",
                    "status": "cancelled",
                    "start": { "dateTime": "2024-01-01T11:00:00Z" },
                    "end": { "dateTime": "2024-01-01T12:00:00Z" }
                },
                {
                    "id": "evt3",
                    "summary": "Company holiday",
                    "start": { "date": "2024-01-02" },
                    "end": { "date": "2024-01-03" }
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(payload).unwrap();
        let events = response.into_events();

        // The cancelled instance is dropped
        assert_eq!(events.len(), 2);

        let planning = &events[0];
        assert_eq!(planning.title(), "Planning");
        assert_eq!(planning.duration_minutes(), 90);
        let me = planning.self_attendee().unwrap();
        assert_eq!(me.email, "me@example.com");
        assert_eq!(me.response_status, Some(ResponseStatus::Accepted));

        let holiday = &events[1];
        assert!(holiday.is_all_day());
        assert_eq!(holiday.duration_minutes(), 0);
    }

    #[test]
    fn event_missing_boundaries_is_kept() {
        let payload = r#"{ "items": [ { "id": "evt1", "summary": "???" } ] }"#;
        let response: EventListResponse = serde_json::from_str(payload).unwrap();
        let events = response.into_events();

        assert_eq!(events.len(), 1);
        assert!(events[0].start.is_none());
        assert_eq!(events[0].duration_minutes(), 0);
    }

    #[test]
    fn calendar_list_filters_and_falls_back() {
        let payload = r##"{
            "items": [
                { "id": "primary@example.com", "summary": "Work", "backgroundColor": "#9fe1e7", "primary": true },
                { "id": "fitness", "summary": "Fitness", "colorId": "4" },
                { "id": "hidden", "summary": "Hidden", "selected": false },
                { "id": "unnamed" },
                { "id": "", "summary": "Broken" }
            ]
        }"##;

        let response: CalendarListResponse = serde_json::from_str(payload).unwrap();
        let calendars = response.into_calendars();

        assert_eq!(calendars.len(), 3);
        assert_eq!(calendars[0].color, "#9fe1e7");
        assert!(calendars[0].primary);
        // colorId stands in when there is no background color
        assert_eq!(calendars[1].color, "4");
        assert_eq!(calendars[2].name, "(unnamed)");
        assert_eq!(calendars[2].color, "#4285f4");
    }

    #[test]
    fn unknown_response_status_maps_to_none() {
        assert_eq!(parse_response_status("accepted"), Some(ResponseStatus::Accepted));
        assert_eq!(parse_response_status("needsAction"), Some(ResponseStatus::NeedsAction));
        assert_eq!(parse_response_status("organizer"), None);
    }
}
