//! Third-party character importer client.
//!
//! Fetches character info and lorebook JSON from the configured importer
//! API, authenticating with user-supplied cookies. Destinations pass the
//! egress gate on every request like any other outbound call; the payloads
//! themselves are opaque JSON handed to the import pipeline.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::Settings;
use crate::security::{EgressPolicy, SecurityError, redact};

use super::cookies::cookie_header;

/// Browser User-Agent for importer requests; the upstream rejects obvious
/// bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error(transparent)]
    Blocked(#[from] SecurityError),

    #[error("unauthorized: cookies missing or expired")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("importer API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn transport_error(err: &reqwest::Error) -> ImporterError {
    if err.is_timeout() {
        ImporterError::Timeout
    } else {
        ImporterError::Network(redact(&err.to_string()))
    }
}

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("id pattern"));

/// Pull a character id out of user input: a bare numeric id or SID, or a
/// character URL (`https://host/character/{id}`, mobile variants included).
pub fn extract_character_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.starts_with("http") || input.to_ascii_lowercase().contains("quack") {
        if let Ok(parsed) = Url::parse(input) {
            let segments: Vec<&str> = parsed
                .path()
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();

            for window in segments.windows(2) {
                if window[0] == "character" {
                    return Some(window[1].to_string());
                }
            }
            if let [only] = segments.as_slice() {
                return Some((*only).to_string());
            }
        }
    }

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    None
}

#[derive(Debug, Clone)]
pub struct ImporterClient {
    http: reqwest::Client,
    base_url: String,
    character_path: String,
    lorebook_path: String,
    cookies: IndexMap<String, String>,
    user_agent: String,
    policy: EgressPolicy,
}

impl ImporterClient {
    pub fn new(
        http: reqwest::Client,
        settings: &Settings,
        policy: EgressPolicy,
        cookies: IndexMap<String, String>,
    ) -> Self {
        Self {
            http,
            base_url: settings.importer_base_url.trim_end_matches('/').to_string(),
            character_path: settings.importer_character_path.clone(),
            lorebook_path: settings.importer_lorebook_path.clone(),
            cookies,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            policy,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    async fn get_json(&self, path: &str, id: &str) -> Result<Value, ImporterError> {
        let url = format!("{}{path}/{id}", self.base_url);
        self.policy.validate(&url).await?;

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        if !self.cookies.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookie_header(&self.cookies));
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        match status {
            401 | 403 => return Err(ImporterError::Unauthorized),
            429 => return Err(ImporterError::RateLimited),
            s if s >= 400 => {
                let body = response.text().await.unwrap_or_default();
                return Err(ImporterError::Upstream {
                    status: s,
                    body: redact(&body),
                });
            }
            _ => {}
        }

        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch raw character info JSON.
    ///
    /// # Errors
    ///
    /// [`ImporterError`] for gate rejection, auth/rate-limit statuses, and
    /// transport failures.
    pub async fn fetch_character(&self, id: &str) -> Result<Value, ImporterError> {
        tracing::debug!(id, "fetching character info");
        self.get_json(&self.character_path, id).await
    }

    /// Fetch the character's lorebook JSON.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_character`].
    pub async fn fetch_lorebook(&self, id: &str) -> Result<Value, ImporterError> {
        tracing::debug!(id, "fetching lorebook");
        self.get_json(&self.lorebook_path, id).await
    }
}
