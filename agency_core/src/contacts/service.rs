use crate::contacts::models::{
    ContactListQuery, ContactNotification, ContactStatus, ContactSubmission, CreateContactRequest,
};
use crate::contacts::repository::{ContactRepository, ContactRepositoryTrait};
use crate::error::AppError;
use crate::websocket::{NotificationEvent, Notifier, NEW_CONTACT_SUBMISSION};
use std::sync::Arc;
use tracing::{debug, error, info};
use validator::Validate;

#[derive(Clone)]
pub struct ContactService {
    repository: Arc<dyn ContactRepositoryTrait + Send + Sync>,
    notifier: Notifier,
}

impl ContactService {
    pub fn new(repository: ContactRepository) -> Self {
        Self::with_repository(Arc::new(repository))
    }

    pub fn with_repository(repository: Arc<dyn ContactRepositoryTrait + Send + Sync>) -> Self {
        Self {
            repository,
            notifier: Notifier::disabled(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Persists a public submission, then tells connected admins about it.
    ///
    /// The broadcast runs only after the insert has produced an id, and its
    /// outcome never changes the result returned to the submitter.
    pub async fn submit(&self, request: CreateContactRequest) -> Result<ContactSubmission, AppError> {
        let request = request.normalized();
        request.validate()?;

        let submission = self.repository.create(&request).await?;
        info!(submission_id = submission.id, "Contact submission stored");

        match NotificationEvent::from_payload(
            NEW_CONTACT_SUBMISSION,
            &ContactNotification::from(&submission),
        ) {
            Ok(event) => {
                if let Some(report) = self.notifier.notify(event).await {
                    debug!(
                        submission_id = submission.id,
                        delivered = report.delivered,
                        failed = report.failed,
                        "Contact notification sent"
                    );
                }
            }
            Err(e) => error!(submission_id = submission.id, "Failed to encode contact notification: {}", e),
        }

        Ok(submission)
    }

    pub async fn list(&self, query: &ContactListQuery) -> Result<Vec<ContactSubmission>, AppError> {
        self.repository.list(query).await
    }

    pub async fn get(&self, id: i64) -> Result<ContactSubmission, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact submission not found".to_string()))
    }

    pub async fn unread_count(&self) -> Result<i64, AppError> {
        self.repository.unread_count().await
    }

    pub async fn update_status(&self, id: i64, status: ContactStatus) -> Result<ContactSubmission, AppError> {
        if !self.repository.update_status(id, status).await? {
            return Err(AppError::NotFound("Contact submission not found".to_string()));
        }

        info!(submission_id = id, status = %status, "Contact status updated");
        self.get(id).await
    }

    pub async fn set_read(&self, id: i64, is_read: bool) -> Result<ContactSubmission, AppError> {
        if !self.repository.set_read(id, is_read).await? {
            return Err(AppError::NotFound("Contact submission not found".to_string()));
        }

        self.get(id).await
    }
}
