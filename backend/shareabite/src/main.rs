//! ShareABite API server entry point.
//!
//! Serves the donor and admin REST API and runs the notification relay in
//! the background. Ctrl-C cancels the relay and drains in-flight requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shareabite::api::{self, ApiState};
use shareabite::config::Config;
use shareabite::db;
use shareabite::mailer::Mailer;
use shareabite::payments::PaymentGateway;
use shareabite::relay::{self, RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Arc::new(Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?);

    let pool = db::init_pool(&config.database_url).await?;

    // One HTTP client for the payment gateway and the mail API.
    let client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let shutdown = CancellationToken::new();

    // ─── Notification relay ───────────────────────────────
    let relay_state = Arc::new(RelayState {
        pool: pool.clone(),
        mailer: Mailer::from_config(client.clone(), &config.mail),
        poll_interval: Duration::from_secs(config.mail.poll_interval_secs),
        batch_size: config.mail.batch_size,
        max_attempts: config.mail.max_attempts,
    });
    let relay_handle = tokio::spawn(relay::run(relay_state, shutdown.clone()));

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(ApiState {
        pool,
        gateway: PaymentGateway::new(client, &config.payment),
        config: config.clone(),
    });
    let app = api::build_router(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    relay_handle.await?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl-C, shutting down");
    shutdown.cancel();
}
