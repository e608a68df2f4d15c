//! Entry point for the agency API server

use agency_core::{
    create_app, get_database_pool, run_migrations, run_server, AppConfig, AppState,
    ConnectionRegistry,
};
use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!("Database URL: {}", config.database.url);

    config.create_directories()
        .map_err(|e| anyhow::anyhow!("Failed to create storage directory: {}", e))?;

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let pool = get_database_pool(&config.database).await
        .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;

    run_migrations(pool.clone()).await
        .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {}", e))?;

    let registry = ConnectionRegistry::new();
    let state = AppState::new(config, pool)
        .map_err(|e| anyhow::anyhow!("Failed to initialise application state: {}", e))?
        .with_websocket(registry);

    match state.auth_service.ensure_bootstrap_admin(&state.config.auth).await {
        Ok(Some(admin)) => info!(username = %admin.username, "Bootstrap admin account created"),
        Ok(None) => {}
        Err(e) => warn!("Failed to create bootstrap admin account: {}", e),
    }

    info!("App: {} v{}", state.app_name, state.version);
    info!(
        "Admin notifications on {} (auth required: {})",
        state.config.websocket.path, state.config.websocket.require_auth
    );

    let app = create_app(state);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "info"
            };

            format!(
                "{bin}={level},agency_core={level},tower_http=debug",
                bin = env!("CARGO_CRATE_NAME").replace('-', "_"),
                level = default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
