//! Matchmaking API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p vibe-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use vibe_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let production = std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(production)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting matchmaking API server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.api.port,
        storage = ?config.backends.storage,
        events = ?config.backends.events,
        "Configuration loaded"
    );

    vibe_api::run(config).await?;

    Ok(())
}
