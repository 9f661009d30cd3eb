//! Nightscout client - fetches the most recent glucose entry
//!
//! One GET against `{base}/api/v1/entries.json?count=1`, optionally
//! authenticated, bounded by the configured timeout. No retries: the first
//! failure is handed back to the caller.
//!
//! Production code uses `NightscoutClient`. Tests use `FakeEntrySource`
//! with pre-configured results.

use crate::reading::GlucoseReading;
use crate::settings::{AuthMode, FetchConfig};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use sha1::{Digest, Sha1};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Path of the "latest entries" resource, relative to the base URL
pub const ENTRIES_PATH: &str = "/api/v1/entries.json";

/// Limits the result to the newest entry
pub const ENTRIES_QUERY: &str = "count=1";

/// Header carrying the hashed API secret
pub const API_SECRET_HEADER: &str = "api-secret";

const AUTHORIZATION_HEADER: &str = "authorization";

/// Fetch errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Nightscout is not configured: {0}")]
    Config(String),

    #[error("Nightscout authentication failed (HTTP {0}). Check your token.")]
    Auth(u16),

    #[error("Nightscout returned status {0}")]
    HttpStatus(u16),

    #[error("No glucose entries returned from Nightscout")]
    EmptyResult,

    #[error("Could not parse Nightscout response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Nightscout request timed out after {0:?}")]
    Timeout(Duration),
}

/// Anything that can produce the latest reading for a configuration
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn latest_reading(&self, config: &FetchConfig) -> Result<GlucoseReading, FetchError>;
}

// ============================================================================
// Request construction
// ============================================================================

/// Resolve the entries URL from a configured base
///
/// Any subpath of the base is kept. A base carrying its own query or
/// fragment is rejected.
pub fn entries_url(base_url: &str) -> Result<Url, FetchError> {
    let base = base_url.trim();
    if base.trim_end_matches('/').is_empty() {
        return Err(FetchError::Config("NIGHTSCOUT_URL is not set".to_string()));
    }

    let mut url = Url::parse(base)
        .map_err(|e| FetchError::Config(format!("invalid NIGHTSCOUT_URL '{}': {}", base, e)))?;

    match url.scheme() {
        "https" | "http" => {}
        other => {
            return Err(FetchError::Config(format!(
                "unsupported scheme '{}' in NIGHTSCOUT_URL",
                other
            )))
        }
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(FetchError::Config(format!(
            "NIGHTSCOUT_URL '{}' must not carry a query or fragment",
            base
        )));
    }

    let path = format!("{}{}", url.path().trim_end_matches('/'), ENTRIES_PATH);
    url.set_path(&path);
    url.set_query(Some(ENTRIES_QUERY));
    Ok(url)
}

/// Lowercase hex SHA-1 of the token, as Nightscout expects in `api-secret`
pub fn api_secret_digest(token: &str) -> String {
    hex::encode(Sha1::digest(token.as_bytes()))
}

/// Header name and value to authenticate with, if a token is configured
pub fn auth_header(config: &FetchConfig) -> Option<(&'static str, String)> {
    let token = config.token.as_deref().filter(|t| !t.is_empty())?;
    match config.auth_mode {
        AuthMode::Bearer => Some((AUTHORIZATION_HEADER, format!("Bearer {}", token))),
        AuthMode::ApiSecretHash => Some((API_SECRET_HEADER, api_secret_digest(token))),
    }
}

/// Turn a 2xx body into the first entry
pub fn parse_entries(body: &str) -> Result<GlucoseReading, FetchError> {
    let data: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let first = data
        .as_array()
        .and_then(|entries| entries.first())
        .ok_or(FetchError::EmptyResult)?;

    GlucoseReading::from_entry(first).map_err(|e| FetchError::Parse(e.to_string()))
}

// ============================================================================
// Real client (Production)
// ============================================================================

/// Fetch the latest reading described by `config`
pub async fn fetch_latest_reading(config: &FetchConfig) -> Result<GlucoseReading, FetchError> {
    let url = entries_url(&config.base_url)?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("glucose-voice/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

    let mut request = client.get(url.clone()).header(ACCEPT, "application/json");
    if let Some((name, value)) = auth_header(config) {
        request = request.header(name, value);
    }

    debug!("Fetching latest entry from {}://{}", url.scheme(), url.host_str().unwrap_or(""));

    // Dropping the losing future closes its connection
    match tokio::time::timeout(config.timeout, execute(request)).await {
        Ok(result) => result,
        Err(_) => {
            info!("Nightscout request exceeded {:?}, aborted", config.timeout);
            Err(FetchError::Timeout(config.timeout))
        }
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<GlucoseReading, FetchError> {
    let response = request.send().await.map_err(network_error)?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Auth(status.as_u16()));
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = response.text().await.map_err(network_error)?;
    parse_entries(&body)
}

fn network_error(e: reqwest::Error) -> FetchError {
    FetchError::Network(e.to_string())
}

/// Entry source backed by a live Nightscout site
#[derive(Debug, Default, Clone, Copy)]
pub struct NightscoutClient;

impl NightscoutClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntrySource for NightscoutClient {
    async fn latest_reading(&self, config: &FetchConfig) -> Result<GlucoseReading, FetchError> {
        fetch_latest_reading(config).await
    }
}

// ============================================================================
// Fake source (Testing)
// ============================================================================

/// Fake entry source with pre-defined results
pub struct FakeEntrySource {
    responses: Mutex<Vec<Result<GlucoseReading, FetchError>>>,
    seen: Mutex<Vec<FetchConfig>>,
}

impl FakeEntrySource {
    /// Results are handed out in order; the last one repeats
    pub fn new(responses: Vec<Result<GlucoseReading, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reading: GlucoseReading) -> Self {
        Self::new(vec![Ok(reading)])
    }

    pub fn always_error(error: FetchError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of fetches made
    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Configurations passed to each fetch, oldest first
    pub fn seen_configs(&self) -> Vec<FetchConfig> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EntrySource for FakeEntrySource {
    async fn latest_reading(&self, config: &FetchConfig) -> Result<GlucoseReading, FetchError> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(config.clone());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.len() {
            0 => Err(FetchError::EmptyResult),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}
