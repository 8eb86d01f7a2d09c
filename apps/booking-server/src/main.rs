//! Booking server
//!
//! Serves the booking REST API on top of the configured record store.
//!
//! # Usage
//!
//! ```bash
//! booking-server --config booking.yaml --bind 0.0.0.0:3000
//! BOOKING_BACKEND__API_KEY=... booking-server --print-config
//! ```

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use booking_service::config::Config;
use booking_service::BookingServiceModule;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Parser)]
#[command(name = "booking-server", version, about = "Booking submission service")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,booking_service=debug,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.print_config {
        print!("{}", serde_yaml::to_string(&config.redacted())?);
        return Ok(());
    }

    init_tracing(cli.json_logs);
    tracing::info!(config = ?cli.config, "Starting booking server");

    let module = BookingServiceModule::init(config)?;
    let app = module
        .register_rest(axum::Router::new())?
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    tracing::info!(addr = %cli.bind, "Booking server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Booking server stopped");
    Ok(())
}
