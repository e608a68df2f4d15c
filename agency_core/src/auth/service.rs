use crate::auth::jwt::JwtService;
use crate::auth::models::{
    AdminRole, AdminUserResponse, CreateAdminRequest, JwtClaims, LoginRequest, LoginResponse,
    RefreshTokenResponse,
};
use crate::auth::repository::{AdminUserRepository, AdminUserRepositoryTrait};
use crate::config::AuthConfig;
use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct AuthService {
    user_repository: Arc<dyn AdminUserRepositoryTrait + Send + Sync>,
    jwt_service: Arc<JwtService>,
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new(user_repository: AdminUserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repository: Arc::new(user_repository),
            jwt_service: Arc::new(jwt_service),
            argon2: Argon2::default(),
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub async fn create_admin(&self, request: CreateAdminRequest) -> Result<AdminUserResponse, AppError> {
        request.validate()?;
        validate_password_strength(&request.password)?;

        if self.user_repository.get_user_by_username(&request.username).await?.is_some() {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self.user_repository.create_user(&request, &password_hash).await?;

        info!(user_id = user.id, username = %user.username, "Admin user created");
        Ok(AdminUserResponse::from(user))
    }

    /// Seeds the first admin account from configuration when none exists.
    pub async fn ensure_bootstrap_admin(&self, config: &AuthConfig) -> Result<Option<AdminUserResponse>, AppError> {
        if self.user_repository.count_users().await? > 0 {
            return Ok(None);
        }

        let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
            warn!("No admin users exist and no bootstrap credentials are configured");
            return Ok(None);
        };

        let email = config
            .admin_email
            .clone()
            .unwrap_or_else(|| format!("{}@localhost.localdomain", username));

        let created = self
            .create_admin(CreateAdminRequest {
                username: username.clone(),
                email,
                password: password.clone(),
                role: Some(AdminRole::Admin),
            })
            .await?;

        Ok(Some(created))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let user = self
            .user_repository
            .get_user_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        if !self.verify_password(&request.password, &user.password_hash)? {
            warn!(username = %request.username, "Failed admin login attempt");
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        self.user_repository.update_last_login(user.id).await?;

        let access_token = self.jwt_service.generate_access_token(&user)?;
        let refresh_token = self.jwt_service.generate_refresh_token(&user)?;

        info!(user_id = user.id, "Admin logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expiry_seconds(),
            user: AdminUserResponse::from(user),
        })
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse, AppError> {
        let claims = self.jwt_service.validate_refresh_token(refresh_token)?;

        let user_id: i64 = claims.sub.parse()
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        let user = self
            .user_repository
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        let access_token = self.jwt_service.generate_access_token(&user)?;

        Ok(RefreshTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expiry_seconds(),
        })
    }

    pub async fn validate_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let claims = self.jwt_service.validate_access_token(token)?;

        let user_id: i64 = claims.sub.parse()
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        let user = self
            .user_repository
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(claims)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<AdminUserResponse>, AppError> {
        let user = self.user_repository.get_user_by_id(user_id).await?;
        Ok(user.map(AdminUserResponse::from))
    }

    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Authentication(format!("Failed to hash password: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Authentication(format!("Invalid password hash: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::BadRequest(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::BadRequest(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    Ok(())
}
