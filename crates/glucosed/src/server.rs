//! HTTP server for glucosed

use crate::config::DaemonConfig;
use crate::routes;
use crate::skill::{self, SkillContext};
use anyhow::{Context, Result};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
pub struct AppState {
    pub skill: SkillContext,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(skill: SkillContext) -> Self {
        Self {
            skill,
            start_time: Instant::now(),
        }
    }
}

/// A panicking handler still answers with the catch-all speech
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled error: handler panicked: {}", detail);

    Json(skill::error_response()).into_response()
}

/// Build the router without binding a socket
pub fn router(state: AppState, skill_path: &str) -> Router {
    Router::new()
        .merge(routes::skill_routes(skill_path))
        .merge(routes::health_routes())
        .with_state(Arc::new(state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: &DaemonConfig, state: AppState) -> Result<()> {
    let app = router(state, &config.skill_path);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("  Listening on http://{}{}", config.bind_addr, config.skill_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires. If the signal cannot be listened for, never
/// resolve, so the server keeps running.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_on_signal() {
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            wait_for_shutdown(async { Ok(()) }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_signal_failure_keeps_serving() {
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            wait_for_shutdown(async { Err(io::Error::new(io::ErrorKind::Other, "no signals")) }),
        )
        .await;
        assert!(result.is_err());
    }
}
