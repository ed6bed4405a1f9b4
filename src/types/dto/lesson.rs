use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::db::lesson;
use crate::types::dto::common::{to_datetime, to_optional_datetime};
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::{LessonChanges, NewLesson};

pub const DEFAULT_DURATION_MINUTES: i32 = 60;
pub const DEFAULT_LESSON_TYPE: &str = "individual";

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct LessonResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i32,
    pub student_id: i32,
    pub created_by: Option<i32>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub instrument: Option<String>,
    pub lesson_type: String,
    pub status: LessonStatus,
    pub notes: Option<String>,
    pub instructor_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
    pub homework_assigned: Option<String>,
    pub progress_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<lesson::Model> for LessonResponse {
    fn from(model: lesson::Model) -> Self {
        let status = model.status();
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            teacher_id: model.teacher_id,
            student_id: model.student_id,
            created_by: model.created_by,
            scheduled_at: to_datetime(model.scheduled_at),
            duration_minutes: model.duration_minutes,
            instrument: model.instrument,
            lesson_type: model.lesson_type,
            status,
            notes: model.notes,
            instructor_notes: model.instructor_notes,
            admin_notes: model.admin_notes,
            cost: model.cost,
            location: model.location,
            room_number: model.room_number,
            materials_needed: model.materials_needed,
            homework_assigned: model.homework_assigned,
            progress_notes: model.progress_notes,
            created_at: to_datetime(model.created_at),
            updated_at: to_optional_datetime(model.updated_at),
        }
    }
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct LessonCreateRequest {
    #[oai(validator(min_length = 1, max_length = 200))]
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i32,
    pub student_id: i32,
    pub scheduled_at: DateTime<Utc>,
    /// Defaults to 60
    #[oai(validator(minimum(value = "1")))]
    pub duration_minutes: Option<i32>,
    pub instrument: Option<String>,
    /// Defaults to "individual"
    pub lesson_type: Option<String>,
    #[oai(validator(minimum(value = "0")))]
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
}

impl LessonCreateRequest {
    pub fn to_new_lesson(&self, created_by: Option<i32>) -> NewLesson {
        NewLesson {
            title: self.title.clone(),
            description: self.description.clone(),
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            created_by,
            scheduled_at: self.scheduled_at.timestamp(),
            duration_minutes: self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            instrument: self.instrument.clone(),
            lesson_type: self
                .lesson_type
                .clone()
                .unwrap_or_else(|| DEFAULT_LESSON_TYPE.to_string()),
            cost: self.cost,
            location: self.location.clone(),
            room_number: self.room_number.clone(),
            materials_needed: self.materials_needed.clone(),
        }
    }
}

/// Partial lesson update; a `status` value is applied as a lifecycle transition
#[derive(Object, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonUpdateRequest {
    #[oai(validator(min_length = 1, max_length = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub teacher_id: Option<i32>,
    pub student_id: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[oai(validator(minimum(value = "1")))]
    pub duration_minutes: Option<i32>,
    pub instrument: Option<String>,
    pub lesson_type: Option<String>,
    pub status: Option<LessonStatus>,
    pub notes: Option<String>,
    pub instructor_notes: Option<String>,
    pub admin_notes: Option<String>,
    #[oai(validator(minimum(value = "0")))]
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
    pub homework_assigned: Option<String>,
    pub progress_notes: Option<String>,
}

impl LessonUpdateRequest {
    /// Column changes, excluding `status`
    pub fn changes(&self) -> LessonChanges {
        LessonChanges {
            title: self.title.clone(),
            description: self.description.clone(),
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            scheduled_at: self.scheduled_at.map(|at| at.timestamp()),
            duration_minutes: self.duration_minutes,
            instrument: self.instrument.clone(),
            lesson_type: self.lesson_type.clone(),
            notes: self.notes.clone(),
            instructor_notes: self.instructor_notes.clone(),
            admin_notes: self.admin_notes.clone(),
            cost: self.cost,
            location: self.location.clone(),
            room_number: self.room_number.clone(),
            materials_needed: self.materials_needed.clone(),
            homework_assigned: self.homework_assigned.clone(),
            progress_notes: self.progress_notes.clone(),
        }
    }
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct BulkLessonCreateRequest {
    pub lessons: Vec<LessonCreateRequest>,
}

/// Result of a bulk lesson create; `errors` holds one message per failed row
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkLessonCreateResponse {
    pub message: String,
    pub created: u32,
    pub errors: Vec<String>,
    pub lessons: Vec<LessonResponse>,
}

/// Lessons of one calendar day in an instructor schedule
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ScheduleDay {
    /// `YYYY-MM-DD`
    pub date: String,
    pub lessons: Vec<LessonResponse>,
}
