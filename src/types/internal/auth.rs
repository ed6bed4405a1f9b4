use serde::{Deserialize, Serialize};

use crate::types::db::user;
use crate::types::internal::role::Role;

/// Marker carried in every session token's `type` claim
pub const ACCESS_TOKEN_TYPE: &str = "access_token";

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Numeric user id
    pub user_id: i32,

    pub role: Role,

    /// Legacy teacher flag, derived from `role`
    pub is_teacher: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token kind marker, always [`ACCESS_TOKEN_TYPE`] for session tokens
    #[serde(rename = "type")]
    pub token_type: String,
}

/// The resolved, active user behind a request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: user::Model,
    pub role: Role,
}

impl Principal {
    pub fn new(user: user::Model) -> Self {
        let role = user.role();
        Self { user, role }
    }

    pub fn id(&self) -> i32 {
        self.user.id
    }

    /// Admins and instructors; their mutations are audited
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Instructor)
    }
}
