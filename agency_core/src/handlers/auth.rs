use crate::auth::models::{
    AdminUserResponse, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
};
use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::middleware::auth::{jwt_auth_middleware, AuthUser};
use crate::models::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Extension, State},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let login_response = state.auth_service.login(request).await?;
    Ok(Json(login_response))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let refresh_response = state.auth_service.refresh_token(&request.refresh_token).await?;
    Ok(Json(refresh_response))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state
        .auth_service
        .get_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Tokens are stateless; the client discards them.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Successfully logged out"))
}

pub fn create_auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .merge(protected)
}
