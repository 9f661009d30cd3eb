//! Skill request dispatch
//!
//! Routes one request envelope to its handler:
//!
//! | Request | Handler |
//! |---------|---------|
//! | `LaunchRequest` | welcome + reprompt |
//! | `GetGlucoseIntent` | Nightscout fetch → speech |
//! | `AMAZON.HelpIntent` | help + reprompt |
//! | `AMAZON.CancelIntent`, `AMAZON.StopIntent` | goodbye |
//! | `AMAZON.FallbackIntent` | didn't understand + reprompt |
//! | `SessionEndedRequest` | log only, empty response |
//!
//! Anything else ends up in the catch-all, which logs and apologises.

use glucose_common::alexa::{
    RequestEnvelope, ResponseBuilder, ResponseEnvelope, SessionError, SkillRequest,
};
use glucose_common::{handle_glucose_query, now_millis, EntrySource, Settings};
use std::sync::Arc;
use tracing::{error, info};

pub const GET_GLUCOSE_INTENT: &str = "GetGlucoseIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

pub const WELCOME_SPEECH: &str =
    "Welcome to Glucose Monitor. You can say \"what is my glucose\" to get your latest reading.";
pub const WELCOME_REPROMPT: &str = "Try saying: what is my glucose?";
pub const HELP_SPEECH: &str =
    "You can say \"what is my glucose\" and I will read your latest Nightscout value. What would you like to do?";
pub const GOODBYE_SPEECH: &str = "Goodbye!";
pub const FALLBACK_SPEECH: &str = "I didn't understand that. Try saying: what is my glucose?";

/// Spoken by the catch-all handler
pub const ERROR_SPEECH: &str = "Sorry, something went wrong. Please try again.";

/// Skill errors that end up in the catch-all
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Malformed request envelope: {0}")]
    MalformedEnvelope(String),

    #[error("No handler for request type {0}")]
    UnsupportedRequest(String),

    #[error("No handler for intent '{0}'")]
    UnknownIntent(String),
}

/// Where a request's settings come from
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Read the process environment on every request
    Environment,
    /// Always use these settings
    Fixed(Settings),
}

impl SettingsSource {
    pub fn load(&self) -> Settings {
        match self {
            SettingsSource::Environment => Settings::from_env(),
            SettingsSource::Fixed(settings) => settings.clone(),
        }
    }
}

/// Time source for reading ages
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(i64),
}

impl Clock {
    pub fn now_millis(&self) -> i64 {
        match self {
            Clock::System => now_millis(),
            Clock::Fixed(millis) => *millis,
        }
    }
}

/// What the handlers need from the outside world
#[derive(Clone)]
pub struct SkillContext {
    pub entries: Arc<dyn EntrySource>,
    pub settings: SettingsSource,
    pub clock: Clock,
}

impl SkillContext {
    pub fn new(entries: Arc<dyn EntrySource>, settings: SettingsSource, clock: Clock) -> Self {
        Self {
            entries,
            settings,
            clock,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Handle a raw request body. Never fails: errors become the catch-all.
pub async fn handle_body(ctx: &SkillContext, body: &[u8]) -> ResponseEnvelope {
    let result = match serde_json::from_slice::<RequestEnvelope>(body) {
        Ok(envelope) => dispatch(ctx, &envelope).await,
        Err(e) => Err(SkillError::MalformedEnvelope(e.to_string())),
    };

    result.unwrap_or_else(|e| {
        error!("Unhandled error: {}", e);
        error_response()
    })
}

/// Route a parsed envelope to its handler
pub async fn dispatch(
    ctx: &SkillContext,
    envelope: &RequestEnvelope,
) -> Result<ResponseEnvelope, SkillError> {
    match &envelope.request {
        SkillRequest::LaunchRequest { .. } => Ok(launch()),
        SkillRequest::IntentRequest { intent, .. } => match intent.name.as_str() {
            GET_GLUCOSE_INTENT => Ok(get_glucose(ctx).await),
            HELP_INTENT => Ok(help()),
            CANCEL_INTENT | STOP_INTENT => Ok(cancel_and_stop()),
            FALLBACK_INTENT => Ok(fallback()),
            other => Err(SkillError::UnknownIntent(other.to_string())),
        },
        SkillRequest::SessionEndedRequest { reason, error, .. } => {
            Ok(session_ended(reason.as_deref(), error.as_ref()))
        }
        SkillRequest::Unsupported => Err(SkillError::UnsupportedRequest(
            envelope.request.type_name().to_string(),
        )),
    }
}

/// Catch-all response
pub fn error_response() -> ResponseEnvelope {
    ResponseBuilder::new().speak(ERROR_SPEECH).build()
}

// ============================================================================
// Handlers
// ============================================================================

fn launch() -> ResponseEnvelope {
    ResponseBuilder::new()
        .speak(WELCOME_SPEECH)
        .reprompt(WELCOME_REPROMPT)
        .build()
}

async fn get_glucose(ctx: &SkillContext) -> ResponseEnvelope {
    info!("GetGlucoseIntent invoked");

    let settings = ctx.settings.load();
    let result =
        handle_glucose_query(ctx.entries.as_ref(), &settings, ctx.clock.now_millis()).await;

    ResponseBuilder::new().speak(result.text()).build()
}

fn help() -> ResponseEnvelope {
    ResponseBuilder::new()
        .speak(HELP_SPEECH)
        .reprompt(HELP_SPEECH)
        .build()
}

fn cancel_and_stop() -> ResponseEnvelope {
    ResponseBuilder::new().speak(GOODBYE_SPEECH).build()
}

fn fallback() -> ResponseEnvelope {
    ResponseBuilder::new()
        .speak(FALLBACK_SPEECH)
        .reprompt(FALLBACK_SPEECH)
        .build()
}

fn session_ended(reason: Option<&str>, error: Option<&SessionError>) -> ResponseEnvelope {
    match error {
        Some(e) => error!("Session ended with error: {} {}", e.kind, e.message),
        None => info!("Session ended: {}", reason.unwrap_or("unknown")),
    }
    ResponseBuilder::new().build()
}
