use crate::types::internal::role::Role;

/// Validated data for inserting a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub profile: UserProfile,
}

/// Plain-text account data as submitted; the user provider validates and
/// hashes it into a [`NewUser`]
#[derive(Debug, Clone)]
pub struct UserRegistration {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub profile: UserProfile,
}

/// Optional profile columns shared by create and update payloads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub profile: UserProfile,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.full_name.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.profile == UserProfile::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub created_since: Option<i64>,
    pub skip: u64,
    pub limit: Option<u64>,
}
