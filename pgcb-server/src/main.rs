//! Payment Gateway Callback Server
//!
//! Receives signed payment outcome callbacks from the gateway and reconciles
//! them against the order store.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use pgcb_core::callback::CallbackHandler;
use pgcb_core::config::ConfigStore;
use pgcb_core::events::{ChannelEventPublisher, callback_event_channel};
use pgcb_core::framework::DatabaseProcessor;
use pgcb_core::processors::EventForwarder;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Payment gateway callback receiver
#[derive(Parser, Debug)]
#[command(name = "pgcb-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./pgcb-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting pgcb-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.listen;
    let gateway_config = ConfigStore::new(loaded_config.gateway);
    let events_config = ConfigStore::new(loaded_config.events);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Downstream event delivery
    let (events_tx, events_rx) = callback_event_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let forwarder = EventForwarder::new(events_rx, events_config.clone(), shutdown_rx);
    let forwarder_handle = tokio::spawn(forwarder.run());

    let callbacks = CallbackHandler::new(
        gateway_config.clone(),
        Arc::new(DatabaseProcessor {
            pool: db_pool.clone(),
        }),
        Arc::new(ChannelEventPublisher::new(events_tx)),
    );
    let state = AppState::new(callbacks, gateway_config, events_config);

    let reload_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    match forwarder_handle.await {
        Ok(report) if report.abandoned > 0 => {
            tracing::warn!(
                drained = report.drained,
                abandoned = report.abandoned,
                "EventForwarder stopped with undelivered events"
            );
        }
        Ok(report) => {
            tracing::info!(drained = report.drained, "EventForwarder stopped");
        }
        Err(e) => {
            tracing::error!("EventForwarder task failed: {}", e);
        }
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
