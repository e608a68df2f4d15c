use crate::auth::models::{AdminRole, AdminUser, CreateAdminRequest};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const ADMIN_COLUMNS: &str =
    "id, username, email, password_hash, role, created_at, last_login, is_active";

#[async_trait]
pub trait AdminUserRepositoryTrait {
    async fn create_user(&self, request: &CreateAdminRequest, password_hash: &str) -> Result<AdminUser, AppError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<AdminUser>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError>;
    async fn count_users(&self) -> Result<i64, AppError>;
    async fn update_last_login(&self, user_id: i64) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct AdminUserRepository {
    pool: SqlitePool,
}

impl AdminUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserRepositoryTrait for AdminUserRepository {
    async fn create_user(&self, request: &CreateAdminRequest, password_hash: &str) -> Result<AdminUser, AppError> {
        let now = Utc::now();
        let role = request.role.as_ref().unwrap_or(&AdminRole::Editor).to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO admin_users (username, email, password_hash, role, created_at, is_active)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(password_hash)
        .bind(&role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Username or email already exists".to_string())
            }
            _ => AppError::Database(format!("Failed to create admin user: {}", e)),
        })?;

        Ok(AdminUser {
            id: result.last_insert_rowid(),
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            last_login: None,
            is_active: true,
        })
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<AdminUser>, AppError> {
        let query = format!("SELECT {} FROM admin_users WHERE id = ?", ADMIN_COLUMNS);
        let user = sqlx::query_as::<_, AdminUser>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get admin user by ID: {}", e)))?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
        let query = format!("SELECT {} FROM admin_users WHERE username = ?", ADMIN_COLUMNS);
        let user = sqlx::query_as::<_, AdminUser>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get admin user by username: {}", e)))?;

        Ok(user)
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count admin users: {}", e)))?;

        Ok(count)
    }

    async fn update_last_login(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;

        Ok(())
    }
}
