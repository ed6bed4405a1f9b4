use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::db::user;
use crate::types::dto::common::{to_datetime, to_optional_datetime};
use crate::types::internal::role::Role;
use crate::types::internal::user::{UserChanges, UserProfile, UserRegistration};

/// User as returned by the API; never carries the password hash
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,

    /// Legacy flag derived from `role`
    pub is_teacher: bool,
    pub is_active: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,
    pub instructor_roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        let role = model.role();
        let instructor_roles = model.instructor_role_ids();
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            full_name: model.full_name,
            role,
            is_teacher: role.is_teacher(),
            is_active: model.is_active,
            phone: model.phone,
            address: model.address,
            emergency_contact: model.emergency_contact,
            notes: model.notes,
            hourly_rate: model.hourly_rate,
            specializations: model.specializations,
            instructor_roles,
            created_at: to_datetime(model.created_at),
            updated_at: to_optional_datetime(model.updated_at),
            last_login: to_optional_datetime(model.last_login),
        }
    }
}

/// Short user view embedded in reports
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            full_name: model.full_name.clone(),
            email: model.email.clone(),
            role: model.role(),
        }
    }
}

/// Account creation by an admin (single and bulk)
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateRequest {
    #[oai(validator(pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))]
    pub email: String,
    #[oai(validator(min_length = 3, max_length = 50))]
    pub username: String,
    #[oai(validator(min_length = 1, max_length = 100))]
    pub full_name: String,
    pub password: String,
    pub role: Option<Role>,
    pub is_teacher: Option<bool>,
    pub is_active: Option<bool>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    #[oai(validator(minimum(value = "0")))]
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,
}

impl UserCreateRequest {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            phone: self.phone.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            notes: self.notes.clone(),
            hourly_rate: self.hourly_rate,
            specializations: self.specializations.clone(),
        }
    }

    /// Student unless a role (or the legacy teacher flag) says otherwise
    pub fn registration(&self) -> UserRegistration {
        UserRegistration {
            email: self.email.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            password: self.password.clone(),
            role: Role::from_legacy(self.role, self.is_teacher).unwrap_or(Role::Student),
            is_active: self.is_active.unwrap_or(true),
            profile: self.profile(),
        }
    }
}

/// Partial user update; omitted fields are left unchanged
#[derive(Object, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    #[oai(validator(pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))]
    pub email: Option<String>,
    #[oai(validator(min_length = 3, max_length = 50))]
    pub username: Option<String>,
    #[oai(validator(min_length = 1, max_length = 100))]
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_teacher: Option<bool>,
    pub is_active: Option<bool>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    #[oai(validator(minimum(value = "0")))]
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,
}

impl UserUpdateRequest {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            phone: self.phone.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            notes: self.notes.clone(),
            hourly_rate: self.hourly_rate,
            specializations: self.specializations.clone(),
        }
    }

    /// Role requested by this update, honoring the legacy flag
    pub fn requested_role(&self) -> Option<Role> {
        Role::from_legacy(self.role, self.is_teacher)
    }

    /// Column changes with the password still in plain text; the caller
    /// hashes it into `password_hash`
    pub fn changes(&self) -> UserChanges {
        UserChanges {
            email: self.email.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            password_hash: None,
            role: self.requested_role(),
            is_active: self.is_active,
            profile: self.profile(),
        }
    }
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct BulkUserCreateRequest {
    pub users: Vec<UserCreateRequest>,
}

/// Result of a bulk user create; `errors` holds one message per failed row
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkUserCreateResponse {
    pub message: String,
    pub created: u32,
    pub errors: Vec<String>,
    pub users: Vec<UserResponse>,
}
