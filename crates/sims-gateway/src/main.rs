//! SIMS Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p sims-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

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
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting SIMS Gateway Server...");

    let config = AppConfig::from_env().context("loading configuration")?;

    info!(
        env = ?config.app.env,
        port = config.gateway.port,
        "Configuration loaded"
    );

    sims_gateway::run(config).await?;

    Ok(())
}
