//! API routes for glucosed

use crate::server::AppState;
use crate::skill;
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use glucose_common::alexa::ResponseEnvelope;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Skill Routes
// ============================================================================

pub fn skill_routes(skill_path: &str) -> Router<AppStateArc> {
    Router::new().route(skill_path, post(handle_skill))
}

/// The body is parsed by the skill layer so malformed envelopes still get
/// a spoken answer instead of a 4xx.
async fn handle_skill(State(state): State<AppStateArc>, body: Bytes) -> Json<ResponseEnvelope> {
    debug!("Skill request: {} bytes", body.len());
    Json(skill::handle_body(&state.skill, &body).await)
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
