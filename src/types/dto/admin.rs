use std::collections::HashMap;

use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::providers::InstructorRole;
use crate::types::db::{audit_log, system_setting};
use crate::types::dto::common::{to_datetime, to_optional_datetime};
use crate::types::dto::user::UserSummary;
use crate::types::internal::role::Role;

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AdminDashboardResponse {
    pub total_users: u64,
    pub total_instructors: u64,
    pub total_students: u64,
    pub total_lessons: u64,
    pub lessons_today: u64,
    /// Last 7 days
    pub lessons_this_week: u64,
    /// Last 30 days
    pub lessons_this_month: u64,
    pub active_users: u64,
    /// Accounts created in the last 7 days
    pub recent_registrations: u64,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserReportResponse {
    pub user: UserSummary,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub cancelled_lessons: u64,
    pub upcoming_lessons: u64,
    pub last_lesson_date: Option<DateTime<Utc>>,
}

#[derive(Object, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructorStats {
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub revenue: f64,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LessonReportResponse {
    /// `YYYY-MM-DD to YYYY-MM-DD`
    pub date_range: String,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub cancelled_lessons: u64,
    /// Sum of `cost` over completed lessons
    pub revenue: f64,
    pub popular_instruments: HashMap<String, u64>,
    /// Keyed by teacher full name
    pub instructor_stats: HashMap<String, InstructorStats>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PromoteToAdminRequest {
    pub user_id: i32,
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<system_setting::Model> for SettingResponse {
    fn from(model: system_setting::Model) -> Self {
        Self {
            key: model.key,
            value: model.value,
            description: model.description,
            created_at: to_datetime(model.created_at),
            updated_at: to_optional_datetime(model.updated_at),
        }
    }
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SettingCreateRequest {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SettingUpdateRequest {
    pub value: String,
    pub description: Option<String>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AuditLogResponse {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<i32>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_log::Model> for AuditLogResponse {
    fn from(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource_type: model.resource_type,
            resource_id: model.resource_id,
            details: model.details,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            request_id: model.request_id,
            created_at: to_datetime(model.created_at),
        }
    }
}

/// Entry of the static instructor-role catalog
#[derive(Object, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorRoleResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

impl From<&InstructorRole> for InstructorRoleResponse {
    fn from(role: &InstructorRole) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name.to_string(),
            description: role.description.to_string(),
            permissions: role.permissions(),
        }
    }
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AssignInstructorRoleRequest {
    pub instructor_id: i32,
    pub role_id: String,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct InstructorWithRolesResponse {
    pub instructor: UserSummary,
    pub roles: Vec<InstructorRoleResponse>,
}
