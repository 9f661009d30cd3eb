//! Glucose Daemon - Alexa skill endpoint for Nightscout readings
//!
//! Answers "what is my glucose" with the latest Nightscout entry.

use anyhow::Result;
use glucose_common::NightscoutClient;
use glucosed::config::DaemonConfig;
use glucosed::logging::{self, BOOTSTRAP_LOG_LEVEL};
use glucosed::server::{self, AppState};
use glucosed::skill::{Clock, SettingsSource, SkillContext};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = logging::with_bootstrap_logging(
        logging::env_filter(BOOTSTRAP_LOG_LEVEL),
        std::io::stdout,
        DaemonConfig::load,
    )?;

    // Initialize logging
    logging::init(&config.log_level);

    info!("Glucose Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let skill = SkillContext::new(
        Arc::new(NightscoutClient::new()),
        SettingsSource::Environment,
        Clock::System,
    );

    server::run(&config, AppState::new(skill)).await?;

    info!("Glucose Daemon stopped");
    Ok(())
}
