//! Glucose query pipeline
//!
//! fetch latest entry → build speech. Any fetch failure is logged in full
//! and becomes the same spoken apology; the listener never hears why.

use crate::nightscout::EntrySource;
use crate::settings::Settings;
use crate::speech::build_speech;
use tracing::{debug, error};

/// Spoken when the reading could not be fetched
pub const FETCH_APOLOGY: &str =
    "Sorry, I could not get your glucose reading right now. Please try again later.";

/// Outcome of one glucose query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechResult {
    Reading(String),
    Apology,
}

impl SpeechResult {
    pub fn text(&self) -> &str {
        match self {
            SpeechResult::Reading(speech) => speech,
            SpeechResult::Apology => FETCH_APOLOGY,
        }
    }

    pub fn is_apology(&self) -> bool {
        matches!(self, SpeechResult::Apology)
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Answer "what is my glucose"
pub async fn handle_glucose_query(
    source: &dyn EntrySource,
    settings: &Settings,
    now_millis: i64,
) -> SpeechResult {
    match source.latest_reading(&settings.fetch).await {
        Ok(reading) => {
            debug!(
                "Nightscout entry: {}",
                serde_json::to_string(&reading).unwrap_or_default()
            );
            SpeechResult::Reading(build_speech(&reading, &settings.speech, now_millis))
        }
        Err(e) => {
            error!("Nightscout fetch error: {}", e);
            SpeechResult::Apology
        }
    }
}
