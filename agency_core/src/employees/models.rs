use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Public path prefix that proxies stored images through signed URLs.
pub const IMAGE_PROXY_PREFIX: &str = "/api/images/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_path: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the public verification page is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub department: Option<String>,
    pub photo_url: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl From<Employee> for EmployeeProfile {
    fn from(employee: Employee) -> Self {
        Self {
            photo_url: employee.photo_path.as_deref().and_then(public_photo_url),
            employee_id: employee.employee_id,
            name: employee.name,
            position: employee.position,
            department: employee.department,
            join_date: employee.join_date,
            is_active: employee.is_active,
        }
    }
}

/// Turns a stored photo reference into something a browser can load.
///
/// Absolute http(s) URLs are returned as-is. Anything else is treated as an
/// object key and routed through the image proxy, so bucket paths never leak.
pub fn public_photo_url(photo_path: &str) -> Option<String> {
    let trimmed = photo_path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }

    let key = trimmed
        .strip_prefix(IMAGE_PROXY_PREFIX)
        .or_else(|| trimmed.strip_prefix("/objects/"))
        .unwrap_or(trimmed)
        .trim_start_matches('/');

    if key.is_empty() {
        None
    } else {
        Some(format!("{}{}", IMAGE_PROXY_PREFIX, key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerificationLog {
    pub id: i64,
    pub employee_id: String,
    pub found: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total: i64,
    pub found: i64,
    pub not_found: i64,
    pub recent: Vec<VerificationLog>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 50, message = "Employee ID is required (max 50 characters)"))]
    pub employee_id: String,

    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Position is required (max 100 characters)"))]
    pub position: String,

    #[validate(length(max = 100))]
    pub department: Option<String>,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 40))]
    pub phone: Option<String>,

    #[validate(length(max = 500))]
    pub photo_path: Option<String>,

    pub join_date: Option<NaiveDate>,

    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their stored value.
///
/// Optional columns take `Some(None)` when the body sends `null`, which clears them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 50))]
    pub employee_id: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub department: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 40))]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500))]
    pub photo_path: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub join_date: Option<Option<NaiveDate>>,

    pub is_active: Option<bool>,
}

/// Present-but-null becomes `Some(None)`; absence is left to `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateEmployeeRequest {
    pub fn apply_to(self, employee: &mut Employee) {
        if let Some(employee_id) = self.employee_id {
            employee.employee_id = employee_id;
        }
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(position) = self.position {
            employee.position = position;
        }
        if let Some(department) = self.department {
            employee.department = department;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if let Some(phone) = self.phone {
            employee.phone = phone;
        }
        if let Some(photo_path) = self.photo_path {
            employee.photo_path = photo_path;
        }
        if let Some(join_date) = self.join_date {
            employee.join_date = join_date;
        }
        if let Some(is_active) = self.is_active {
            employee.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatsQuery {
    pub recent: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(photo_path: Option<&str>) -> Employee {
        Employee {
            id: 1,
            employee_id: "EMP-001".to_string(),
            name: "Ravi".to_string(),
            position: "Designer".to_string(),
            department: Some("Creative".to_string()),
            email: Some("ravi@agency.test".to_string()),
            phone: Some("+1 555 0100".to_string()),
            photo_path: photo_path.map(str::to_string),
            join_date: NaiveDate::from_ymd_opt(2023, 4, 1),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_photo_keys_are_routed_through_proxy() {
        assert_eq!(
            public_photo_url("employees/ravi.jpg").as_deref(),
            Some("/api/images/employees/ravi.jpg")
        );
        assert_eq!(
            public_photo_url("/objects/employees/ravi.jpg").as_deref(),
            Some("/api/images/employees/ravi.jpg")
        );
        assert_eq!(
            public_photo_url("/api/images/employees/ravi.jpg").as_deref(),
            Some("/api/images/employees/ravi.jpg")
        );
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        assert_eq!(
            public_photo_url("https://cdn.test/ravi.jpg").as_deref(),
            Some("https://cdn.test/ravi.jpg")
        );
        assert_eq!(public_photo_url("   "), None);
        assert_eq!(public_photo_url("/objects/"), None);
    }

    #[test]
    fn test_profile_omits_contact_details() {
        let profile = EmployeeProfile::from(employee(Some("employees/ravi.jpg")));
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["employeeId"], "EMP-001");
        assert_eq!(value["photoUrl"], "/api/images/employees/ravi.jpg");
        assert_eq!(value["joinDate"], "2023-04-01");
        assert!(value.get("email").is_none());
        assert!(value.get("phone").is_none());
        assert!(value.get("photoPath").is_none());
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let mut stored = employee(None);
        UpdateEmployeeRequest {
            position: Some("Lead Designer".to_string()),
            is_active: Some(false),
            ..Default::default()
        }
        .apply_to(&mut stored);

        assert_eq!(stored.position, "Lead Designer");
        assert!(!stored.is_active);
        assert_eq!(stored.name, "Ravi");
        assert_eq!(stored.department.as_deref(), Some("Creative"));
    }

    #[test]
    fn test_update_null_clears_optional_fields() {
        let mut stored = employee(Some("employees/ravi.jpg"));
        let request: UpdateEmployeeRequest = serde_json::from_value(serde_json::json!({
            "photoPath": null,
            "joinDate": null,
            "department": "Studio"
        }))
        .unwrap();
        assert_eq!(request.photo_path, Some(None));
        assert_eq!(request.email, None);

        request.apply_to(&mut stored);
        assert_eq!(stored.photo_path, None);
        assert_eq!(stored.join_date, None);
        assert_eq!(stored.department.as_deref(), Some("Studio"));
        assert_eq!(stored.email.as_deref(), Some("ravi@agency.test"));
    }

    #[test]
    fn test_update_validates_present_values_only() {
        let cleared = UpdateEmployeeRequest {
            email: Some(None),
            ..Default::default()
        };
        assert!(cleared.validate().is_ok());

        let invalid = UpdateEmployeeRequest {
            email: Some(Some("not-an-email".to_string())),
            ..Default::default()
        };
        assert!(invalid.validate().unwrap_err().field_errors().contains_key("email"));
    }
}
