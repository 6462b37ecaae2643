//! SIMS push worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p sims-push
//! ```
//!
//! Configuration is loaded from environment variables.

use std::sync::Arc;

use anyhow::Context;
use sims_common::{try_init_tracing, AppConfig};
use sims_push::{HttpPushTransport, PushDispatcher, PushWorker};
use sims_service::services::ServiceContext;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Push worker failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting SIMS push worker...");

    let config = AppConfig::from_env().context("loading configuration")?;
    info!(
        env = ?config.app.env,
        concurrency = config.push.concurrency,
        "Configuration loaded"
    );

    let ctx = Arc::new(
        ServiceContext::connect(&config)
            .await
            .context("connecting services")?,
    );
    let transport = HttpPushTransport::new(&config.push).context("building push transport")?;
    let dispatcher = PushDispatcher::new(ctx.clone(), Arc::new(transport), config.push.concurrency);

    PushWorker::new(ctx, dispatcher)
        .run(shutdown_signal())
        .await
        .context("push worker")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
