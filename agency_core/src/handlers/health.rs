//! Liveness and dependency health

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub version: String,
    pub database: &'static str,
    pub storage: &'static str,
    pub websocket_connections: usize,
    pub timestamp: i64,
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = match state.db_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: database unavailable: {}", e);
            false
        }
    };

    let storage_ok = match state.storage.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: storage unavailable: {}", e);
            false
        }
    };

    let websocket_connections = match &state.websocket_registry {
        Some(registry) => registry.open_count().await,
        None => 0,
    };

    let (status_code, status) = match (database_ok, storage_ok) {
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (true, true) => (StatusCode::OK, "healthy"),
    };

    let report = HealthReport {
        status,
        version: state.version.clone(),
        database: if database_ok { "healthy" } else { "unhealthy" },
        storage: if storage_ok { "healthy" } else { "unhealthy" },
        websocket_connections,
        timestamp: chrono::Utc::now().timestamp(),
    };

    (status_code, Json(report))
}
