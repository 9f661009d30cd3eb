//! Command handlers for glucosectl.

use anyhow::{Context, Result};
use glucose_common::alexa::{RequestEnvelope, ResponseEnvelope};
use glucose_common::nightscout::{entries_url, fetch_latest_reading};
use glucose_common::speech::build_speech;
use glucose_common::{now_millis, AuthMode, Settings};

use crate::client::{discover_skill_url, SkillClient};

const KEY_WIDTH: usize = 12;

fn print_kv(key: &str, value: &str) {
    println!("{:width$} {}", key, value, width = KEY_WIDTH);
}

/// Handle reading command
///
/// Unlike the skill, failures are reported in full here.
pub async fn handle_reading(json: bool) -> Result<()> {
    let settings = Settings::from_env();
    let reading = fetch_latest_reading(&settings.fetch)
        .await
        .context("Could not fetch the latest reading")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        println!("{}", build_speech(&reading, &settings.speech, now_millis()));
    }
    Ok(())
}

/// Handle ask command
pub async fn handle_ask(intent: Option<String>, url: Option<String>) -> Result<()> {
    let url = discover_skill_url(url.as_deref(), |key| std::env::var(key).ok());
    let client = SkillClient::new(url)?;

    let envelope = ask_envelope(intent.as_deref());
    let response = client.send(&envelope).await?;

    for (key, value) in response_lines(&response) {
        print_kv(key, &value);
    }
    Ok(())
}

/// Handle config command
pub fn handle_config() -> Result<()> {
    for (key, value) in settings_lines(&Settings::from_env()) {
        print_kv(key, &value);
    }
    Ok(())
}

/// Launch request when no intent is given
pub fn ask_envelope(intent: Option<&str>) -> RequestEnvelope {
    match intent {
        Some(name) => RequestEnvelope::intent(name),
        None => RequestEnvelope::launch(),
    }
}

pub fn response_lines(response: &ResponseEnvelope) -> Vec<(&'static str, String)> {
    let mut lines = vec![(
        "speech",
        response
            .speech_text()
            .unwrap_or_else(|| "(silent)".to_string()),
    )];
    if let Some(reprompt) = response.reprompt_text() {
        lines.push(("reprompt", reprompt));
    }
    lines
}

/// Effective settings, token redacted
pub fn settings_lines(settings: &Settings) -> Vec<(&'static str, String)> {
    let fetch = &settings.fetch;

    let url = if fetch.base_url.is_empty() {
        "(not set)".to_string()
    } else {
        fetch.base_url.clone()
    };

    let entries = match entries_url(&fetch.base_url) {
        Ok(url) => url.to_string(),
        Err(e) => format!("invalid: {}", e),
    };

    let auth = match (&fetch.token, fetch.auth_mode) {
        (None, _) => "none".to_string(),
        (Some(_), AuthMode::Bearer) => "bearer token (set)".to_string(),
        (Some(_), AuthMode::ApiSecretHash) => "api-secret sha1 (set)".to_string(),
    };

    vec![
        ("nightscout", url),
        ("entries", entries),
        ("auth", auth),
        ("timeout", format!("{}s", fetch.timeout.as_secs())),
        ("units", settings.speech.units.as_str().to_string()),
        (
            "stale_after",
            format!("{} min", settings.speech.stale_after_minutes),
        ),
    ]
}
