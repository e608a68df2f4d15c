use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Contacted,
    Closed,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactStatus::New => write!(f, "new"),
            ContactStatus::Contacted => write!(f, "contacted"),
            ContactStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ContactStatus::New),
            "contacted" => Ok(ContactStatus::Contacted),
            "closed" => Ok(ContactStatus::Closed),
            _ => Err(format!("Invalid contact status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of the `new_contact_submission` event. Mirrors the stored row, nothing derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactNotification {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ContactSubmission> for ContactNotification {
    fn from(submission: &ContactSubmission) -> Self {
        Self {
            id: submission.id,
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            created_at: submission.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ContactRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub status: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactSubmission {
    type Error = AppError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            message: row.message,
            status: row.status.parse::<ContactStatus>().map_err(AppError::Database)?,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(max = 40, message = "Phone number must not exceed 40 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Company must not exceed 200 characters"))]
    pub company: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Message is required (max 5000 characters)"))]
    pub message: String,
}

impl CreateContactRequest {
    /// Trims fields and turns blank optionals into `None`.
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(self.phone),
            company: optional(self.company),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ContactStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default = "default_true")]
    pub is_read: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListQuery {
    pub status: Option<ContactStatus>,
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ContactSubmittedResponse {
    pub message: String,
    pub submission: ContactSubmission,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> CreateContactRequest {
        CreateContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some("   ".to_string()),
            company: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_round_trip_through_text() {
        for status in [ContactStatus::New, ContactStatus::Contacted, ContactStatus::Closed] {
            assert_eq!(status.to_string().parse::<ContactStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_optionals() {
        let normalized = request("  Asha ", " a@x.com ", " Hi ").normalized();
        assert_eq!(normalized.name, "Asha");
        assert_eq!(normalized.email, "a@x.com");
        assert_eq!(normalized.message, "Hi");
        assert_eq!(normalized.phone, None);
    }

    #[test]
    fn test_validation_reports_each_field() {
        let errors = request("", "not-an-email", "").normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("message"));
    }

    #[test]
    fn test_missing_required_fields_reach_validation() {
        let request: CreateContactRequest = serde_json::from_value(serde_json::json!({ "name": "Asha" })).unwrap();
        let errors = request.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_submission_serializes_camel_case() {
        let submission = ContactSubmission {
            id: 1,
            name: "Asha".to_string(),
            email: "a@x.com".to_string(),
            phone: None,
            company: None,
            message: "Hi".to_string(),
            status: ContactStatus::New,
            is_read: false,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["status"], "new");
        assert_eq!(value["isRead"], false);
        assert!(value.get("createdAt").is_some());

        let notification = serde_json::to_value(ContactNotification::from(&submission)).unwrap();
        let keys: Vec<&str> = notification.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5);
        for key in ["id", "name", "email", "message", "createdAt"] {
            assert!(keys.contains(&key));
        }
    }
}
