use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::internal::role::Role;

/// Self-service registration payload
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[oai(validator(pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))]
    pub email: String,
    #[oai(validator(min_length = 3, max_length = 50))]
    pub username: String,
    #[oai(validator(min_length = 1, max_length = 100))]
    pub full_name: String,
    /// At least 8 characters
    pub password: String,

    /// `student` (default) or `instructor`
    pub role: Option<Role>,

    /// Legacy flag; `true` means instructor when `role` is absent
    pub is_teacher: Option<bool>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

/// Form-encoded login payload; `username` may also be an email address
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Session token issued on login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Seconds until the token expires
    pub expires_in: i64,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password for verification
    pub old_password: String,

    /// New password, at least 8 characters
    pub new_password: String,
}
