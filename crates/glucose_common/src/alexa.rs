//! Alexa skill request/response envelopes
//!
//! Only the parts of the Alexa Skills Kit JSON interface this skill reads
//! or writes. Unknown fields are ignored on input.

use serde::{Deserialize, Serialize};

pub const ENVELOPE_VERSION: &str = "1.0";

fn default_version() -> String {
    ENVELOPE_VERSION.to_string()
}

// ============================================================================
// Requests
// ============================================================================

/// Incoming skill request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,

    pub request: SkillRequest,
}

/// The `request` object, classified by its `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SkillRequest {
    LaunchRequest {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    IntentRequest {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        intent: Intent,
    },
    SessionEndedRequest {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<SessionError>,
    },
    /// Any request type this skill has no handler for
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl SkillRequest {
    /// Value of the `type` tag, for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            SkillRequest::LaunchRequest { .. } => "LaunchRequest",
            SkillRequest::IntentRequest { .. } => "IntentRequest",
            SkillRequest::SessionEndedRequest { .. } => "SessionEndedRequest",
            SkillRequest::Unsupported => "Unsupported",
        }
    }

    pub fn intent_name(&self) -> Option<&str> {
        match self {
            SkillRequest::IntentRequest { intent, .. } => Some(&intent.name),
            _ => None,
        }
    }
}

impl RequestEnvelope {
    fn wrap(request: SkillRequest) -> Self {
        Self {
            version: default_version(),
            session: None,
            context: None,
            request,
        }
    }

    pub fn launch() -> Self {
        Self::wrap(SkillRequest::LaunchRequest { request_id: None })
    }

    pub fn intent(name: impl Into<String>) -> Self {
        Self::wrap(SkillRequest::IntentRequest {
            request_id: None,
            intent: Intent {
                name: name.into(),
                slots: None,
            },
        })
    }

    pub fn session_ended(reason: impl Into<String>) -> Self {
        Self::wrap(SkillRequest::SessionEndedRequest {
            request_id: None,
            reason: Some(reason.into()),
            error: None,
        })
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText {
        text: String,
    },
    #[serde(rename = "SSML")]
    Ssml {
        ssml: String,
    },
}

impl OutputSpeech {
    /// Wrap plain text as SSML
    pub fn ssml(text: &str) -> Self {
        OutputSpeech::Ssml {
            ssml: format!("<speak>{}</speak>", escape_ssml(text)),
        }
    }

    /// The words spoken, markup removed
    pub fn text(&self) -> String {
        match self {
            OutputSpeech::PlainText { text } => text.clone(),
            OutputSpeech::Ssml { ssml } => {
                let inner = ssml
                    .trim()
                    .strip_prefix("<speak>")
                    .and_then(|s| s.strip_suffix("</speak>"))
                    .unwrap_or(ssml.as_str());
                unescape_ssml(inner)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reprompt {
    #[serde(rename = "outputSpeech")]
    pub output_speech: OutputSpeech,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillResponse {
    #[serde(rename = "outputSpeech", default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,

    #[serde(rename = "shouldEndSession", default, skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

/// Outgoing skill response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default = "default_version")]
    pub version: String,
    pub response: SkillResponse,
}

impl ResponseEnvelope {
    pub fn speech_text(&self) -> Option<String> {
        self.response.output_speech.as_ref().map(OutputSpeech::text)
    }

    pub fn reprompt_text(&self) -> Option<String> {
        self.response
            .reprompt
            .as_ref()
            .map(|r| r.output_speech.text())
    }
}

/// Builds a response the way the skill handlers describe it
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    response: SkillResponse,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speak(mut self, text: &str) -> Self {
        self.response.output_speech = Some(OutputSpeech::ssml(text));
        self
    }

    /// A reprompt keeps the session open
    pub fn reprompt(mut self, text: &str) -> Self {
        self.response.reprompt = Some(Reprompt {
            output_speech: OutputSpeech::ssml(text),
        });
        self.response.should_end_session = Some(false);
        self
    }

    pub fn build(self) -> ResponseEnvelope {
        ResponseEnvelope {
            version: default_version(),
            response: self.response,
        }
    }
}

fn escape_ssml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_ssml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
