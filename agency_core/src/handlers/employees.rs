//! Public employee verification and admin employee management

use crate::{
    employees::{
        CreateEmployeeRequest, UpdateEmployeeRequest, VerificationContext, VerificationStatsQuery,
    },
    error::{AppError, Result},
    extractors::ApiJson,
    models::{ApiResponse, MessageResponse},
    AppState,
};
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;

/// Client address, preferring the first hop of `X-Forwarded-For`.
fn verification_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> VerificationContext {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    VerificationContext {
        ip_address: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

pub async fn verify_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let context = verification_context(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    match state.employees.verify(&employee_id, &context).await? {
        Some(profile) => Ok(Json(profile)),
        None => Err(AppError::NotFound("Employee not found".to_string())),
    }
}

pub async fn list_employees(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let employees = state.employees.list().await?;
    Ok(Json(ApiResponse::success(employees)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let employee = state.employees.get(id).await?;
    Ok(Json(ApiResponse::success(employee)))
}

pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEmployeeRequest>,
) -> Result<impl IntoResponse> {
    let employee = state.employees.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateEmployeeRequest>,
) -> Result<impl IntoResponse> {
    let employee = state.employees.update(id, request).await?;
    Ok(Json(ApiResponse::success(employee)))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.employees.delete(id).await?;
    Ok(Json(MessageResponse::new("Employee deleted")))
}

pub async fn verification_stats(
    State(state): State<AppState>,
    Query(query): Query<VerificationStatsQuery>,
) -> Result<impl IntoResponse> {
    let stats = state.employees.verification_stats(query.recent).await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.7, 10.0.0.1".parse().unwrap());
        headers.insert(USER_AGENT, "curl/8".parse().unwrap());

        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let context = verification_context(&headers, Some(peer));
        assert_eq!(context.ip_address.as_deref(), Some("198.51.100.7"));
        assert_eq!(context.user_agent.as_deref(), Some("curl/8"));

        let context = verification_context(&HeaderMap::new(), Some(peer));
        assert_eq!(context.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(context.user_agent, None);
    }
}
