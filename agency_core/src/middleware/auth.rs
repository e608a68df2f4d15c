use crate::auth::models::AdminRole;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: AdminRole,
}

impl AuthUser {
    pub fn new(user_id: i64, username: String, role: AdminRole) -> Self {
        Self {
            user_id,
            username,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, AdminRole::Admin)
    }
}

/// Resolves a raw access token into an `AuthUser`, checking that the account is still active.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state.auth_service.validate_token(token).await?;

    let role: AdminRole = claims.role.parse()
        .map_err(|_| AppError::Authentication("Invalid role in token".to_string()))?;

    let user_id: i64 = claims.sub.parse()
        .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

    Ok(AuthUser::new(user_id, claims.username, role))
}

pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_header(request.headers())?;
    let auth_user = authenticate_token(&state, &token).await?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

    if !auth_user.is_admin() {
        return Err(AppError::Authorization(
            "Admin access required".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

fn extract_token_from_header(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid Authorization header format".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication(
            "Authorization header must start with 'Bearer '".to_string(),
        ))?;

    if token.is_empty() {
        return Err(AppError::Authentication("Empty token".to_string()));
    }

    Ok(token.to_string())
}
