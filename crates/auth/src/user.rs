//! User accounts.
//!
//! Users are plain documents (not event-sourced): one per person per
//! organization, identified by a lowercased email unique within the org.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use itrax_core::{OrgId, Record, RecordId};

use crate::Role;

/// Account status. Inactive users cannot log in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    Active,
    #[serde(alias = "DISABLED")]
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
        }
    }

    /// Lenient parse used for admin input (`"active"`, `"Inactive"`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(UserStatus::Active),
            "INACTIVE" | "DISABLED" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    pub password_hash: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub org_id: OrgId,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub department: String,
    pub location_id: Option<RecordId>,
    pub status: UserStatus,
}

impl User {
    pub fn new(input: NewUser) -> Self {
        let now = itrax_core::time::now();
        Self {
            id: RecordId::new(),
            org_id: input.org_id,
            role: input.role,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: normalize_email(&input.email),
            phone: input.phone,
            department: input.department,
            location_id: input.location_id,
            password_hash: input.password_hash,
            timezone: None,
            status: input.status,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", trimmed when either part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            name: self.full_name(),
            org_id: self.org_id,
        }
    }
}

impl Record for User {
    const COLLECTION: &'static str = "users";
    const SEARCH_FIELDS: &'static [&'static str] = &["firstName", "lastName", "email", "department"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["email"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn org_id(&self) -> OrgId {
        self.org_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "role" => Some(Cow::Borrowed(self.role.as_str())),
            "firstName" => Some(Cow::Borrowed(&self.first_name)),
            "lastName" => Some(Cow::Borrowed(&self.last_name)),
            "email" => Some(Cow::Borrowed(&self.email)),
            "phone" => Some(Cow::Borrowed(&self.phone)),
            "department" => Some(Cow::Borrowed(&self.department)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "locationId" => self.location_id.map(|id| Cow::Owned(id.to_string())),
            _ => None,
        }
    }
}

/// What clients see of a user: never the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: RecordId,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub org_id: OrgId,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Role granted on self-service signup: the first account becomes the admin.
pub fn signup_role(existing_users: u64) -> Role {
    if existing_users == 0 { Role::Admin } else { Role::Employee }
}
