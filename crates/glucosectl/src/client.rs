//! Skill client - posts envelopes to a running glucosed

use anyhow::{Context, Result};
use glucose_common::alexa::{RequestEnvelope, ResponseEnvelope};
use std::time::Duration;

/// Default skill endpoint of a local glucosed
pub const DEFAULT_SKILL_URL: &str = "http://127.0.0.1:7866/alexa";

pub const SKILL_URL_ENV: &str = "GLUCOSED_URL";

/// Discover the skill endpoint
///
/// Priority:
/// 1. Explicit --url flag
/// 2. $GLUCOSED_URL
/// 3. http://127.0.0.1:7866/alexa
pub fn discover_skill_url<F>(explicit: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = explicit {
        return url.to_string();
    }

    if let Some(url) = lookup(SKILL_URL_ENV).filter(|u| !u.trim().is_empty()) {
        return url;
    }

    DEFAULT_SKILL_URL.to_string()
}

pub struct SkillClient {
    url: String,
    http: reqwest::Client,
}

impl SkillClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        // Above the daemon's own Nightscout timeout
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(&self, envelope: &RequestEnvelope) -> Result<ResponseEnvelope> {
        let response = self
            .http
            .post(&self.url)
            .json(envelope)
            .send()
            .await
            .with_context(|| format!("Daemon unavailable at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Daemon returned HTTP {}", status);
        }

        response
            .json::<ResponseEnvelope>()
            .await
            .context("Daemon returned an invalid skill response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_wins() {
        let url = discover_skill_url(Some("http://box:1/alexa"), |_| {
            Some("http://env:2/alexa".to_string())
        });
        assert_eq!(url, "http://box:1/alexa");
    }

    #[test]
    fn test_env_url() {
        let url = discover_skill_url(None, |key| {
            (key == SKILL_URL_ENV).then(|| "http://env:2/alexa".to_string())
        });
        assert_eq!(url, "http://env:2/alexa");
    }

    #[test]
    fn test_default_url() {
        assert_eq!(discover_skill_url(None, |_| None), DEFAULT_SKILL_URL);
        assert_eq!(
            discover_skill_url(None, |_| Some("  ".to_string())),
            DEFAULT_SKILL_URL
        );
    }
}
