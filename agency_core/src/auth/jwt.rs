use crate::auth::models::{AdminUser, JwtClaims};
use crate::config::AuthConfig;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: Duration,
    refresh_token_expiry: Duration,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.len() < 32 {
            return Err(AppError::Authentication(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_token_expiry: Duration::minutes(config.access_token_minutes),
            refresh_token_expiry: Duration::days(config.refresh_token_days),
        })
    }

    pub fn generate_access_token(&self, user: &AdminUser) -> Result<String, AppError> {
        self.generate(user, ACCESS, self.access_token_expiry)
    }

    pub fn generate_refresh_token(&self, user: &AdminUser) -> Result<String, AppError> {
        self.generate(user, REFRESH, self.refresh_token_expiry)
    }

    fn generate(&self, user: &AdminUser, token_type: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Authentication(format!("Failed to generate {} token: {}", token_type, e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != ACCESS {
            return Err(AppError::Authentication(
                "Invalid token type for access token".to_string(),
            ));
        }

        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != REFRESH {
            return Err(AppError::Authentication(
                "Invalid token type for refresh token".to_string(),
            ));
        }

        Ok(claims)
    }

    pub fn get_access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry.num_seconds()
    }
}
