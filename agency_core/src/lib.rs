//! Core library for the agency site backend: contact inbox, employee
//! verification, signed-URL image storage and live admin notifications.

pub mod auth;
pub mod config;
pub mod contacts;
pub mod database;
pub mod employees;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod storage;
pub mod websocket;

pub use auth::{AuthService, JwtService};
pub use config::AppConfig;
pub use contacts::{ContactService, ContactSubmission};
pub use database::{get_database_pool, run_migrations, DatabaseManager};
pub use employees::{EmployeeProfile, EmployeeService};
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use middleware::auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use storage::ObjectStorage;
pub use websocket::{websocket_handler, ConnectionRegistry, EventBroadcaster, Notifier};

use axum::{extract::DefaultBodyLimit, Router};
use sqlx::SqlitePool;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use auth::AdminUserRepository;
use contacts::ContactRepository;
use employees::EmployeeRepository;

/// Headroom on top of the upload limit for JSON envelopes and headers.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
    pub db_manager: DatabaseManager,
    pub auth_service: AuthService,
    pub contacts: ContactService,
    pub employees: EmployeeService,
    pub storage: ObjectStorage,
    /// `None` until a registry is attached; notifications are then dropped with a warning.
    pub websocket_registry: Option<ConnectionRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: SqlitePool) -> Result<Self> {
        let jwt_service = JwtService::new(&config.auth)?;
        let auth_service = AuthService::new(AdminUserRepository::new(pool.clone()), jwt_service);
        let storage = ObjectStorage::new(&config.storage, &config.auth.jwt_secret);

        Ok(Self {
            app_name: "Agency API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_manager: DatabaseManager::new(pool.clone()),
            auth_service,
            contacts: ContactService::new(ContactRepository::new(pool.clone())),
            employees: EmployeeService::new(EmployeeRepository::new(pool)),
            storage,
            websocket_registry: None,
            config: Arc::new(config),
        })
    }

    /// Attaches the live connection registry and routes contact notifications through it.
    pub fn with_websocket(mut self, registry: ConnectionRegistry) -> Self {
        let notifier = Notifier::new(Arc::new(registry.clone()));
        self.contacts = self.contacts.with_notifier(notifier);
        self.websocket_registry = Some(registry);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db_manager.pool()
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.storage.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_OVERHEAD);

    create_routes(&state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::cors::cors_layer_from_config(&state.config.cors))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
