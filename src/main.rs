//! Fraud Detection Analytics - call detail record dashboards
//!
//! Runs a fixed catalog of warehouse queries on every page load and renders:
//! - Risky destination analysis (outgoing voice towards high-risk countries)
//! - SMS spamming (senders above the volume threshold)
//! - A sidebar listing the countries currently scored as risky

mod chrome;
mod config;
mod dashboard;
mod db;
mod web;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = config::Config::load()?;
    init_logging(&config.logging);
    info!("Starting Fraud Detection Analytics...");

    // Missing logo is fatal
    let logo = chrome::Logo::load(&config.dashboard.logo)?;

    let warehouse = db::Warehouse::new(&config.warehouse).await?;
    warehouse.run_migrations().await?;
    info!("Warehouse ready: {}", config.warehouse.url);

    if config.warehouse.seed_demo {
        db::seed::seed_demo(&warehouse).await?;
    }

    info!("Fetch policy: {:?}", config.dashboard.fetch_policy);
    web::start_server(&config, warehouse, logo).await?;

    Ok(())
}

/// RUST_LOG wins over the configured level. LOG_FORMAT=gcp switches to
/// structured GCP Cloud Logging.
fn init_logging(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_lowercase()));

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
