use crate::employees::models::{
    CreateEmployeeRequest, Employee, VerificationContext, VerificationLog, VerificationStats,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const EMPLOYEE_COLUMNS: &str = "id, employee_id, name, position, department, email, phone, \
     photo_path, join_date, is_active, created_at, updated_at";

fn map_write_error(action: &str, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("Employee ID already exists".to_string())
        }
        _ => AppError::Database(format!("Failed to {} employee: {}", action, e)),
    }
}

#[async_trait]
pub trait EmployeeRepositoryTrait {
    async fn list(&self) -> Result<Vec<Employee>, AppError>;
    async fn get(&self, id: i64) -> Result<Option<Employee>, AppError>;
    async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<Employee>, AppError>;
    async fn create(&self, request: &CreateEmployeeRequest) -> Result<Employee, AppError>;
    async fn update(&self, employee: &Employee) -> Result<Employee, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
    async fn log_verification(
        &self,
        identifier: &str,
        found: bool,
        context: &VerificationContext,
    ) -> Result<(), AppError>;
    async fn verification_stats(&self, recent_limit: i64) -> Result<VerificationStats, AppError>;
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepositoryTrait for EmployeeRepository {
    async fn list(&self) -> Result<Vec<Employee>, AppError> {
        let query = format!("SELECT {} FROM employees ORDER BY name ASC, id ASC", EMPLOYEE_COLUMNS);
        let employees = sqlx::query_as::<_, Employee>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list employees: {}", e)))?;

        Ok(employees)
    }

    async fn get(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let query = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get employee: {}", e)))?;

        Ok(employee)
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        let query = format!("SELECT {} FROM employees WHERE employee_id = ?", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up employee: {}", e)))?;

        Ok(employee)
    }

    async fn create(&self, request: &CreateEmployeeRequest) -> Result<Employee, AppError> {
        let now = Utc::now();
        let is_active = request.is_active.unwrap_or(true);

        let result = sqlx::query(
            r#"
            INSERT INTO employees (employee_id, name, position, department, email, phone,
                                   photo_path, join_date, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.employee_id)
        .bind(&request.name)
        .bind(&request.position)
        .bind(&request.department)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.photo_path)
        .bind(request.join_date)
        .bind(is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("create", e))?;

        Ok(Employee {
            id: result.last_insert_rowid(),
            employee_id: request.employee_id.clone(),
            name: request.name.clone(),
            position: request.position.clone(),
            department: request.department.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            photo_path: request.photo_path.clone(),
            join_date: request.join_date,
            is_active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, employee: &Employee) -> Result<Employee, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE employees
            SET employee_id = ?, name = ?, position = ?, department = ?, email = ?, phone = ?,
                photo_path = ?, join_date = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.position)
        .bind(&employee.department)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.photo_path)
        .bind(employee.join_date)
        .bind(employee.is_active)
        .bind(now)
        .bind(employee.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        Ok(Employee {
            updated_at: now,
            ..employee.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete employee: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn log_verification(
        &self,
        identifier: &str,
        found: bool,
        context: &VerificationContext,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO verification_logs (employee_id, found, ip_address, user_agent, verified_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(identifier)
        .bind(found)
        .bind(&context.ip_address)
        .bind(&context.user_agent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to log verification: {}", e)))?;

        Ok(())
    }

    async fn verification_stats(&self, recent_limit: i64) -> Result<VerificationStats, AppError> {
        let (total, found): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN found THEN 1 ELSE 0 END), 0) FROM verification_logs",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate verifications: {}", e)))?;

        let recent = sqlx::query_as::<_, VerificationLog>(
            r#"
            SELECT id, employee_id, found, ip_address, user_agent, verified_at
            FROM verification_logs
            ORDER BY verified_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(recent_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load recent verifications: {}", e)))?;

        Ok(VerificationStats {
            total,
            found,
            not_found: total - found,
            recent,
        })
    }
}
