use crate::employees::models::{
    CreateEmployeeRequest, Employee, EmployeeProfile, UpdateEmployeeRequest, VerificationContext,
    VerificationStats,
};
use crate::employees::repository::{EmployeeRepository, EmployeeRepositoryTrait};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

const DEFAULT_RECENT_VERIFICATIONS: i64 = 20;
const MAX_RECENT_VERIFICATIONS: i64 = 200;

#[derive(Clone)]
pub struct EmployeeService {
    repository: Arc<dyn EmployeeRepositoryTrait + Send + Sync>,
}

impl EmployeeService {
    pub fn new(repository: EmployeeRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Public lookup. Every call, hit or miss, appends one verification log row
    /// keyed by the identifier exactly as submitted.
    pub async fn verify(
        &self,
        identifier: &str,
        context: &VerificationContext,
    ) -> Result<Option<EmployeeProfile>, AppError> {
        let employee = self.repository.find_by_employee_id(identifier).await?;
        let found = employee.is_some();

        self.repository.log_verification(identifier, found, context).await?;
        info!(employee_id = %identifier, found, "Employee verification attempt");

        Ok(employee.map(EmployeeProfile::from))
    }

    pub async fn verification_stats(&self, recent: Option<i64>) -> Result<VerificationStats, AppError> {
        let limit = recent
            .unwrap_or(DEFAULT_RECENT_VERIFICATIONS)
            .clamp(0, MAX_RECENT_VERIFICATIONS);
        self.repository.verification_stats(limit).await
    }

    pub async fn list(&self) -> Result<Vec<Employee>, AppError> {
        self.repository.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Employee, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
    }

    pub async fn create(&self, request: CreateEmployeeRequest) -> Result<Employee, AppError> {
        request.validate()?;

        let employee = self.repository.create(&request).await?;
        info!(id = employee.id, employee_id = %employee.employee_id, "Employee created");
        Ok(employee)
    }

    pub async fn update(&self, id: i64, request: UpdateEmployeeRequest) -> Result<Employee, AppError> {
        request.validate()?;

        let mut employee = self.get(id).await?;
        request.apply_to(&mut employee);

        let updated = self.repository.update(&employee).await?;
        info!(id, "Employee updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        info!(id, "Employee deleted");
        Ok(())
    }
}
