use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use itrax_auth::{NewUser, Role, User, UserStatus, normalize_email};
use itrax_core::validation::clean;
use itrax_core::{DomainError, FieldErrors, OrgId, RecordId};

/// Columns of the employee CSV export.
pub const EXPORT_FIELDS: [&str; 8] = [
    "firstName",
    "lastName",
    "email",
    "phone",
    "department",
    "location",
    "assignedAssets",
    "status",
];

const TEMP_PASSWORD_LEN: usize = 12;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub location_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub location_id: Option<RecordId>,
    pub status: UserStatus,
}

impl EmployeeInput {
    pub fn validate(self) -> Result<ValidEmployee, DomainError> {
        let mut errors = FieldErrors::new();

        let first_name = clean(self.first_name);
        if first_name.is_none() {
            errors.add("firstName", "First name is required");
        }
        let last_name = clean(self.last_name);
        if last_name.is_none() {
            errors.add("lastName", "Last name is required");
        }
        let email = clean(self.email).map(|e| normalize_email(&e));
        if email.is_none() {
            errors.add("email", "Email is required");
        }

        let location_id = match clean(self.location_id) {
            None => None,
            Some(raw) => {
                let parsed = raw.parse::<RecordId>().ok();
                if parsed.is_none() {
                    errors.add("locationId", "Invalid location");
                }
                parsed
            }
        };

        let status = match clean(self.status) {
            None => UserStatus::Active,
            Some(raw) => UserStatus::parse(&raw).unwrap_or_else(|| {
                errors.add("status", "Status must be ACTIVE or INACTIVE");
                UserStatus::Active
            }),
        };

        let (Some(first_name), Some(last_name), Some(email)) = (first_name, last_name, email) else {
            return Err(DomainError::Fields(errors));
        };
        errors.into_result()?;

        Ok(ValidEmployee {
            first_name,
            last_name,
            email,
            phone: clean(self.phone).unwrap_or_default(),
            department: clean(self.department).unwrap_or_default(),
            location_id,
            status,
        })
    }
}

impl ValidEmployee {
    /// A new `EMPLOYEE` account; `password_hash` is the hashed temp password.
    pub fn into_user(self, org_id: OrgId, password_hash: String) -> User {
        User::new(NewUser {
            org_id,
            role: Role::Employee,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash,
            phone: self.phone,
            department: self.department,
            location_id: self.location_id,
            status: self.status,
        })
    }

    /// Overwrite the admin-editable profile fields of `user`.
    pub fn apply_to(self, user: &mut User, at: DateTime<Utc>) {
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.email = self.email;
        user.phone = self.phone;
        user.department = self.department;
        user.location_id = self.location_id;
        user.status = self.status;
        user.updated_at = at;
    }
}

/// One-off password handed to the admin when an employee account is created.
pub fn temp_password() -> String {
    Uuid::new_v4().simple().to_string()[..TEMP_PASSWORD_LEN].to_string()
}

/// An employee as listed to admins: profile plus assignment figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub location_id: Option<RecordId>,
    pub location_name: String,
    #[serde(skip)]
    location: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub assigned_assets: u64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmployeeRow {
    /// `location_name` of `None` is shown as `N/A`.
    pub fn new(user: &User, assigned_assets: u64, location_name: Option<String>) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            department: user.department.clone(),
            location_id: user.location_id,
            location_name: location_name.clone().unwrap_or_else(|| "N/A".to_string()),
            location: location_name,
            role: user.role,
            status: user.status,
            assigned_assets,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }

    /// One CSV row, matching [`EXPORT_FIELDS`]. Unknown locations export as empty.
    pub fn export_row(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.department.clone(),
            self.location.clone().unwrap_or_default(),
            self.assigned_assets.to_string(),
            self.status.as_str().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(body: serde_json::Value) -> EmployeeInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn names_and_email_are_required() {
        let err = input(json!({"firstName": " ", "email": ""})).validate().unwrap_err();
        let DomainError::Fields(errors) = err else { panic!("expected field errors") };
        assert_eq!(errors.get("firstName"), Some("First name is required"));
        assert_eq!(errors.get("lastName"), Some("Last name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn new_employee_account_is_an_employee() {
        let valid = input(json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": " Grace@Navy.MIL ",
            "department": "Compilers"
        }))
        .validate()
        .unwrap();
        let user = valid.into_user(OrgId::new(), "hash".into());
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.email, "grace@navy.mil");
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn row_shows_na_without_location() {
        let user = input(json!({"firstName": "A", "lastName": "B", "email": "a@b.c"}))
            .validate()
            .unwrap()
            .into_user(OrgId::new(), "hash".into());
        let row = EmployeeRow::new(&user, 2, None);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["locationName"], "N/A");
        assert_eq!(json["assignedAssets"], 2);
        assert!(json.get("passwordHash").is_none());

        let csv = row.export_row();
        assert_eq!(csv.len(), EXPORT_FIELDS.len());
        assert_eq!(csv[5], "");
        assert_eq!(csv[7], "ACTIVE");
    }

    #[test]
    fn temp_passwords_differ() {
        let a = temp_password();
        assert_eq!(a.len(), TEMP_PASSWORD_LEN);
        assert_ne!(a, temp_password());
    }

    #[test]
    fn bad_location_id_is_a_field_error() {
        let err = input(json!({"firstName": "A", "lastName": "B", "email": "a@b.c", "locationId": "nope"}))
            .validate()
            .unwrap_err();
        let DomainError::Fields(errors) = err else { panic!("expected field errors") };
        assert!(errors.contains("locationId"));
    }
}
