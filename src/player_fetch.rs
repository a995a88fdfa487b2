use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::http_client::http_client;
use crate::state::{Player, PlayerPage};

/// Failure of one page request, classified the way the fetch controller needs it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("rate limited by the player API (http 429)")]
    RateLimited,
    #[error("{message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },
}

impl FetchError {
    pub fn transient(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transient {
            status,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
            return Self::RateLimited;
        }
        let body = body.trim();
        let message = if body.is_empty() {
            format!("http {status}")
        } else {
            format!("http {status}: {}", truncate(body, 120))
        };
        Self::transient(Some(status), message)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::Transient { status, .. } => *status,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Anything that can hand out cursor-paged players.
pub trait PlayerSource: Send {
    fn label(&self) -> &'static str;

    fn fetch_page(&mut self, cursor: Option<&str>, per_page: u32)
    -> Result<PlayerPage, FetchError>;
}

pub struct BalldontlieSource {
    client: &'static Client,
    base_url: String,
    api_key: String,
}

impl BalldontlieSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("BALLDONTLIE_API_KEY is not set")?;
        Ok(Self {
            client: http_client(config.http_timeout)?,
            base_url: config.api_url.clone(),
            api_key,
        })
    }
}

impl PlayerSource for BalldontlieSource {
    fn label(&self) -> &'static str {
        "balldontlie"
    }

    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        per_page: u32,
    ) -> Result<PlayerPage, FetchError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&players_query(cursor, per_page))
            .header(AUTHORIZATION, self.api_key.as_str())
            .send()
            .map_err(|err| {
                FetchError::transient(
                    err.status().map(|s| s.as_u16()),
                    format!("request failed: {err}"),
                )
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|err| {
            FetchError::transient(Some(status.as_u16()), format!("failed reading body: {err}"))
        })?;
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), &body));
        }

        parse_players_page_json(&body)
            .map_err(|err| FetchError::transient(Some(status.as_u16()), format!("{err:#}")))
    }
}

/// Query pairs for one page. Values are encoded by the request builder, so the cursor stays
/// opaque.
pub fn players_query(cursor: Option<&str>, per_page: u32) -> Vec<(&'static str, String)> {
    let mut query = vec![("per_page", per_page.to_string())];
    if let Some(cursor) = cursor.and_then(non_empty) {
        query.push(("cursor", cursor.to_string()));
    }
    query
}

#[derive(Debug, Deserialize)]
struct PlayersResponse {
    #[serde(default)]
    data: Vec<Player>,
    #[serde(default)]
    meta: Value,
}

/// Parses a `/players` body: `{ "data": [...], "meta": { "next_cursor": .. } }`.
///
/// The cursor is opaque; numbers and strings are both kept as text. A missing or null cursor
/// marks the last page.
pub fn parse_players_page_json(raw: &str) -> Result<PlayerPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(PlayerPage {
            players: Vec::new(),
            next_cursor: None,
        });
    }

    let resp: PlayersResponse = serde_json::from_str(trimmed).context("invalid players json")?;
    let next_cursor = match resp.meta.get("next_cursor") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => non_empty(s).map(|s| s.to_string()),
        _ => None,
    };
    Ok(PlayerPage {
        players: resp.data,
        next_cursor,
    })
}

pub fn retry_after_hint(delay: Duration) -> String {
    let secs = delay.as_secs_f32();
    if secs < 1.0 {
        format!("{}ms", delay.as_millis())
    } else {
        format!("{secs:.0}s")
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
