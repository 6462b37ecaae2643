//! SIMS API Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p sims-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use sims_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting SIMS API Server...");

    let config = AppConfig::from_env().context("loading configuration")?;

    info!(
        env = ?config.app.env,
        port = config.api.port,
        "Configuration loaded"
    );

    sims_api::run(config).await?;

    Ok(())
}
