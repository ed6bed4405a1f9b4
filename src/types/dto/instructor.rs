use std::collections::HashMap;

use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::dto::lesson::{LessonResponse, ScheduleDay};
use crate::types::internal::role::Role;
use crate::types::internal::user::{UserChanges, UserProfile};

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct InstructorDashboardResponse {
    /// Distinct students across all of the instructor's lessons
    pub total_students: u64,
    pub lessons_today: u64,
    pub lessons_this_week: u64,
    pub lessons_this_month: u64,
    /// Next five scheduled lessons
    pub upcoming_lessons: Vec<LessonResponse>,
    /// Last five completed lessons
    pub recent_lessons: Vec<LessonResponse>,
}

/// Self-service profile update; activation is not editable here and `role`
/// may only repeat the current role
#[derive(Object, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructorProfileUpdate {
    pub role: Option<Role>,
    #[oai(validator(pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))]
    pub email: Option<String>,
    #[oai(validator(min_length = 3, max_length = 50))]
    pub username: Option<String>,
    #[oai(validator(min_length = 1, max_length = 100))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    #[oai(validator(minimum(value = "0")))]
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,
}

impl InstructorProfileUpdate {
    pub fn changes(&self) -> UserChanges {
        UserChanges {
            email: self.email.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            profile: UserProfile {
                phone: self.phone.clone(),
                address: self.address.clone(),
                emergency_contact: self.emergency_contact.clone(),
                hourly_rate: self.hourly_rate,
                specializations: self.specializations.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Optional notes recorded when an instructor completes a lesson
#[derive(Object, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonCompletionRequest {
    pub instructor_notes: Option<String>,
    pub progress_notes: Option<String>,
    pub homework_assigned: Option<String>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LessonActionResponse {
    pub message: String,
    pub lesson: LessonResponse,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub date_range: String,
    pub schedule: Vec<ScheduleDay>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct InstructorSummaryReport {
    pub date_range: String,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub cancelled_lessons: u64,
    pub scheduled_lessons: u64,
    pub unique_students: u64,
    pub total_revenue: f64,
    pub total_teaching_hours: f64,
    /// Instrument name to lesson count
    pub instruments_taught: HashMap<String, u64>,
    /// Percentage of completed lessons, 0 when there are none
    pub completion_rate: f64,
}
