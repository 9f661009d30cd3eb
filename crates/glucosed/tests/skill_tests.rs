//! Skill dispatch tests
//!
//! Every intent in the routing table, plus the glucose scenarios end to end
//! through the dispatcher with a fake entry source and a fixed clock.

mod support;

use glucose_common::alexa::RequestEnvelope;
use glucose_common::{
    FakeEntrySource, FetchConfig, FetchError, NightscoutClient, Settings, SpeechConfig,
    UnitSystem, FETCH_APOLOGY,
};
use glucosed::skill::{
    self, dispatch, handle_body, Clock, SettingsSource, SkillContext, SkillError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::{reading, spawn_nightscout, MINUTE, NOW};

fn settings(units: UnitSystem) -> Settings {
    Settings {
        fetch: FetchConfig::new("https://ns.example.org"),
        speech: SpeechConfig {
            units,
            ..SpeechConfig::default()
        },
    }
}

fn context(source: FakeEntrySource, units: UnitSystem) -> SkillContext {
    SkillContext::new(
        Arc::new(source),
        SettingsSource::Fixed(settings(units)),
        Clock::Fixed(NOW),
    )
}

async fn ask(ctx: &SkillContext, envelope: RequestEnvelope) -> (Option<String>, Option<String>) {
    let response = dispatch(ctx, &envelope).await.unwrap();
    (response.speech_text(), response.reprompt_text())
}

// ============================================================================
// GET GLUCOSE
// ============================================================================

#[tokio::test]
async fn test_steady_reading_scenario() {
    let ctx = context(
        FakeEntrySource::always(reading(
            json!({"sgv": 95, "direction": "Flat", "date": NOW - 5 * MINUTE}),
        )),
        UnitSystem::MgDl,
    );

    let (speech, reprompt) = ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
    assert_eq!(
        speech.as_deref(),
        Some("Your glucose is 95 milligrams per decilitre and steady.")
    );
    assert_eq!(reprompt, None);
}

#[tokio::test]
async fn test_stale_mmol_reading() {
    let ctx = context(
        FakeEntrySource::always(reading(
            json!({"sgv": 180, "direction": "DoubleUp", "date": NOW - 42 * MINUTE}),
        )),
        UnitSystem::Mmol,
    );

    let (speech, _) = ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
    assert_eq!(
        speech.as_deref(),
        Some(
            "Your glucose is 10.0 millimoles per litre and rising fast. \
             But heads up, this reading is 42 minutes old."
        )
    );
}

#[tokio::test]
async fn test_fetch_failures_apologise() {
    for error in [
        FetchError::Auth(401),
        FetchError::EmptyResult,
        FetchError::Timeout(Duration::from_secs(8)),
    ] {
        let ctx = context(FakeEntrySource::always_error(error), UnitSystem::MgDl);
        let (speech, reprompt) = ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
        assert_eq!(speech.as_deref(), Some(FETCH_APOLOGY));
        assert_eq!(reprompt, None);
    }
}

#[tokio::test]
async fn test_unauthorized_nightscout_apologises() {
    let base = spawn_nightscout(401, "{\"status\":401}").await;
    let ctx = SkillContext::new(
        Arc::new(NightscoutClient::new()),
        SettingsSource::Fixed(Settings {
            fetch: FetchConfig::new(base),
            speech: SpeechConfig::default(),
        }),
        Clock::Fixed(NOW),
    );

    let (speech, _) = ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
    assert_eq!(speech.as_deref(), Some(FETCH_APOLOGY));
}

#[tokio::test]
async fn test_empty_nightscout_apologises() {
    let base = spawn_nightscout(200, "[]").await;
    let ctx = SkillContext::new(
        Arc::new(NightscoutClient::new()),
        SettingsSource::Fixed(Settings {
            fetch: FetchConfig::new(base),
            speech: SpeechConfig::default(),
        }),
        Clock::Fixed(NOW),
    );

    let (speech, _) = ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
    assert_eq!(speech.as_deref(), Some(FETCH_APOLOGY));
}

#[tokio::test]
async fn test_settings_reloaded_for_every_request() {
    let source = Arc::new(FakeEntrySource::always(reading(json!({"sgv": 100}))));
    let ctx = SkillContext::new(
        source.clone(),
        SettingsSource::Fixed(settings(UnitSystem::MgDl)),
        Clock::Fixed(NOW),
    );

    ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;
    ask(&ctx, RequestEnvelope::intent("GetGlucoseIntent")).await;

    let seen = source.seen_configs();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|c| c.base_url == "https://ns.example.org"));
}

// ============================================================================
// CONVERSATIONAL INTENTS
// ============================================================================

#[tokio::test]
async fn test_launch_welcomes_and_reprompts() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);
    let (speech, reprompt) = ask(&ctx, RequestEnvelope::launch()).await;
    assert_eq!(speech.as_deref(), Some(skill::WELCOME_SPEECH));
    assert_eq!(reprompt.as_deref(), Some("Try saying: what is my glucose?"));
}

#[tokio::test]
async fn test_help_repeats_itself_as_reprompt() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);
    let (speech, reprompt) = ask(&ctx, RequestEnvelope::intent("AMAZON.HelpIntent")).await;
    assert_eq!(speech.as_deref(), Some(skill::HELP_SPEECH));
    assert_eq!(reprompt.as_deref(), Some(skill::HELP_SPEECH));
}

#[tokio::test]
async fn test_cancel_and_stop_say_goodbye() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);
    for intent in ["AMAZON.CancelIntent", "AMAZON.StopIntent"] {
        let (speech, reprompt) = ask(&ctx, RequestEnvelope::intent(intent)).await;
        assert_eq!(speech.as_deref(), Some("Goodbye!"));
        assert_eq!(reprompt, None);
    }
}

#[tokio::test]
async fn test_fallback() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);
    let (speech, reprompt) = ask(&ctx, RequestEnvelope::intent("AMAZON.FallbackIntent")).await;
    assert_eq!(
        speech.as_deref(),
        Some("I didn't understand that. Try saying: what is my glucose?")
    );
    assert_eq!(reprompt, speech);
}

#[tokio::test]
async fn test_session_ended_is_silent() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);

    let response = dispatch(&ctx, &RequestEnvelope::session_ended("USER_INITIATED"))
        .await
        .unwrap();
    assert_eq!(response.speech_text(), None);
    assert_eq!(response.reprompt_text(), None);
    assert_eq!(response.response.should_end_session, None);

    let with_error = json!({
        "request": {
            "type": "SessionEndedRequest",
            "reason": "ERROR",
            "error": {"type": "INVALID_RESPONSE", "message": "oops"}
        }
    });
    let response = handle_body(&ctx, with_error.to_string().as_bytes()).await;
    assert_eq!(response.speech_text(), None);
}

// ============================================================================
// CATCH-ALL
// ============================================================================

#[tokio::test]
async fn test_catch_all_for_unknown_intent_and_request_type() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);

    let unknown_intent = json!({
        "request": {"type": "IntentRequest", "intent": {"name": "BookFlightIntent"}}
    });
    let response = handle_body(&ctx, unknown_intent.to_string().as_bytes()).await;
    assert_eq!(response.speech_text().as_deref(), Some(skill::ERROR_SPEECH));

    let unknown_type = json!({"request": {"type": "Connections.Response"}});
    let result = dispatch(&ctx, &serde_json::from_value(unknown_type).unwrap()).await;
    assert!(matches!(result, Err(SkillError::UnsupportedRequest(_))));
}

#[tokio::test]
async fn test_catch_all_for_envelope_without_request() {
    let ctx = context(FakeEntrySource::always_error(FetchError::EmptyResult), UnitSystem::MgDl);
    let response = handle_body(&ctx, b"{\"version\":\"1.0\"}").await;
    assert_eq!(response.speech_text().as_deref(), Some(skill::ERROR_SPEECH));
}
