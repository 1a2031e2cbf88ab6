//! GivePath - donation platform entry point

use anyhow::Result;
use chrono::Utc;
use givepath_api::AppState;
use givepath_common::config::Config;
use givepath_storage::db::DatabasePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging can honor it
    let config = Config::load()?;
    init_logging(&config);

    info!(hostname = %config.server.hostname, "Starting GivePath server...");

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;
    info!("Database connection established");

    // Run migrations
    db_pool.migrate().await?;
    info!("Database migrations completed");

    // Wire repositories and core components
    let state = Arc::new(AppState::new(db_pool, &config));

    // Start the in-process scheduler sweep if enabled
    let sweep_handle = if config.sweep.enabled {
        let sweep = state.sweep.clone();
        let interval = Duration::from_secs(config.sweep.interval_secs);
        info!("Scheduler sweep enabled, interval {:?}", interval);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match sweep.process_due(Utc::now()).await {
                    Ok(report) if report.processed > 0 => {
                        info!(processed = report.processed, "Sweep processed campaigns");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("Scheduler sweep error: {}", e);
                    }
                }
            }
        }))
    } else {
        info!("Scheduler sweep disabled; use the process-scheduled endpoint");
        None
    };

    // Start API server
    let api_port = config.api.port;
    let app = givepath_api::create_router(state, &config.api.cors_origins);
    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.bind_address, api_port
    ))
    .await?;
    info!("API server listening on port {}", api_port);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    info!("GivePath server started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    api_handle.abort();
    if let Some(handle) = sweep_handle {
        handle.abort();
    }

    info!("GivePath server shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},givepath=debug", config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
