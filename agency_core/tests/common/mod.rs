#![allow(dead_code)]

use agency_core::{
    auth::{AdminRole, CreateAdminRequest, LoginRequest},
    get_database_pool, run_migrations, AppConfig, AppState, ConnectionRegistry,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
};
use serde_json::Value;
use tempfile::TempDir;

pub const PASSWORD: &str = "Secret123";

pub async fn test_state() -> (AppState, TempDir) {
    test_state_with(|_| {}).await
}

pub async fn test_state_with(customize: impl FnOnce(&mut AppConfig)) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.database.url = format!("sqlite:{}", dir.path().join("agency.db").display());
    config.storage.root = dir.path().join("storage");
    customize(&mut config);
    config.create_directories().unwrap();

    let pool = get_database_pool(&config.database).await.unwrap();
    run_migrations(pool.clone()).await.unwrap();

    let state = AppState::new(config, pool)
        .unwrap()
        .with_websocket(ConnectionRegistry::new());

    (state, dir)
}

pub async fn login_as(state: &AppState, username: &str, role: AdminRole) -> String {
    state
        .auth_service
        .create_admin(CreateAdminRequest {
            username: username.to_string(),
            email: format!("{}@agency.test", username),
            password: PASSWORD.to_string(),
            role: Some(role),
        })
        .await
        .unwrap();

    state
        .auth_service
        .login(LoginRequest {
            username: username.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap()
        .access_token
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
