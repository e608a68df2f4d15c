use crate::contacts::models::{
    ContactListQuery, ContactRow, ContactStatus, ContactSubmission, CreateContactRequest,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const CONTACT_COLUMNS: &str =
    "id, name, email, phone, company, message, status, is_read, created_at";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[async_trait]
pub trait ContactRepositoryTrait {
    async fn create(&self, request: &CreateContactRequest) -> Result<ContactSubmission, AppError>;
    async fn get(&self, id: i64) -> Result<Option<ContactSubmission>, AppError>;
    async fn list(&self, query: &ContactListQuery) -> Result<Vec<ContactSubmission>, AppError>;
    async fn unread_count(&self) -> Result<i64, AppError>;
    async fn update_status(&self, id: i64, status: ContactStatus) -> Result<bool, AppError>;
    async fn set_read(&self, id: i64, is_read: bool) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepositoryTrait for ContactRepository {
    async fn create(&self, request: &CreateContactRequest) -> Result<ContactSubmission, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO contact_submissions (name, email, phone, company, message, status, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, 'new', 0, ?)
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.company)
        .bind(&request.message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to store contact submission: {}", e)))?;

        Ok(ContactSubmission {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            company: request.company.clone(),
            message: request.message.clone(),
            status: ContactStatus::New,
            is_read: false,
            created_at: now,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<ContactSubmission>, AppError> {
        let query = format!("SELECT {} FROM contact_submissions WHERE id = ?", CONTACT_COLUMNS);
        let row = sqlx::query_as::<_, ContactRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get contact submission: {}", e)))?;

        row.map(ContactSubmission::try_from).transpose()
    }

    async fn list(&self, query: &ContactListQuery) -> Result<Vec<ContactSubmission>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM contact_submissions WHERE 1 = 1",
            CONTACT_COLUMNS
        ));

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if query.unread_only.unwrap_or(false) {
            builder.push(" AND is_read = 0");
        }

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<ContactRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list contact submissions: {}", e)))?;

        rows.into_iter().map(ContactSubmission::try_from).collect()
    }

    async fn unread_count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count unread submissions: {}", e)))?;

        Ok(count)
    }

    async fn update_status(&self, id: i64, status: ContactStatus) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE contact_submissions SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update contact status: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_read(&self, id: i64, is_read: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE contact_submissions SET is_read = ? WHERE id = ?")
            .bind(is_read)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update read flag: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
