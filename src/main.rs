// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! INSNRG Bridge Server
//!
//! Polls the INSNRG cloud for a pool chlorinator's state and republishes
//! it as individually addressable readings over HTTP.

use anyhow::Context;
use insnrg_bridge::{
    config::Config,
    services::{CognitoClient, CredentialManager, InsnrgClient, RefreshCoordinator},
    time_utils::SystemClock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        system_id = %config.system_id,
        "Starting INSNRG bridge"
    );

    let clock = Arc::new(SystemClock);

    let cognito = CognitoClient::new(
        &config.cognito_client_id,
        &config.cognito_region,
        config.request_timeout,
    )?;
    let credentials = CredentialManager::new(
        Arc::new(cognito),
        config.credentials.clone(),
        clock.clone(),
    )
    .with_timeout(config.request_timeout);

    let api = InsnrgClient::new(&config.api_url, config.request_timeout)?;
    let coordinator = Arc::new(
        RefreshCoordinator::new(config.system_id.clone(), Arc::new(api), credentials, clock)
            .with_request_timeout(config.request_timeout),
    );

    // Not ready until the first refresh has data.
    coordinator
        .trigger_refresh()
        .await
        .context("Initial refresh failed")?;
    tracing::info!("Initial refresh complete");

    let scheduler = coordinator.spawn_scheduler(config.refresh_interval);
    tracing::info!(
        interval_secs = config.refresh_interval.as_secs(),
        "Refresh scheduler started"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        coordinator,
    });

    // Build router
    let app = insnrg_bridge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("insnrg_bridge=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
