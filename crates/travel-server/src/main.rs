//! Travel Catalog - city catalog service with per-user signed tokens

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LogFormat, LoggingConfig};
use travel_api::{AppState, create_router};
use travel_auth::{generate_salt, hash_password};
use travel_db::{Database, NewUser, UserRole};

/// Travel Catalog - city catalog service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TRAVEL_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TRAVEL_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting Travel Catalog v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    describe_metrics();

    // A database that cannot be opened is fatal
    let db = Database::with_max_connections(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let salt = generate_salt();
        db.insert_user(&NewUser {
            username: "admin".to_string(),
            password_hash: hash_password("admin", &salt),
            salt: salt.to_vec(),
            role: UserRole::Admin,
        })
        .await?;
        warn!("Default admin user created (username: admin, password: admin); change it");
    }

    let state = AppState::from_database(db, config.pipeline.to_service_config());

    let app = create_router(state, Some(Arc::new(metrics_handle))).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

fn describe_metrics() {
    metrics::describe_counter!("travel_logins_total", "Login attempts by outcome");
    metrics::describe_counter!("travel_signups_total", "Signup attempts by outcome");
    metrics::describe_counter!("travel_cities_created_total", "Cities created");
    metrics::describe_counter!("travel_health_checks_total", "Health check requests");
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
